//! Per-kind external clients for GitLab resources.
//!
//! This module is organized by GitLab API group:
//! - `projects`: projects and everything scoped under a project
//! - `groups`: groups and their SAML/LDAP links
//! - `runners`: runners
//!
//! Each kind pairs an `ExternalClient` with pure transformer functions
//! (`create_options`, `update_options`, `late_initialize`, `is_up_to_date`,
//! `observation`) that carry all of the field mapping.

pub mod groups;
pub mod projects;
pub mod runners;

use crate::error::ControllerError;
use crds::Managed;
use gitlab_client::{is_not_found, GitLabError};

/// Token material is only returned at create, so there must be somewhere to put it
pub(crate) fn require_connection_secret<K: Managed>(cr: &K) -> Result<(), ControllerError> {
    if cr.resource_spec().write_connection_secret_to_ref.is_none() {
        return Err(ControllerError::MissingIdentifier("writeConnectionSecretToRef"));
    }
    Ok(())
}

/// Map a GitLab read to `None` when the remote object does not exist
pub(crate) fn found<T>(result: Result<T, GitLabError>, kind: &str) -> Result<Option<T>, ControllerError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if is_not_found(&e) => Ok(None),
        Err(e) => Err(ControllerError::remote(format!("observe {kind}"), e)),
    }
}

/// Wrap a failed call as "cannot <verb> <kind>"
pub(crate) fn failed(verb: &str, kind: &str) -> impl FnOnce(GitLabError) -> ControllerError + use<> {
    let action = format!("{verb} {kind}");
    move |e| ControllerError::remote(action, e)
}

/// Deleting something already gone is success
pub(crate) fn deleted(result: Result<(), GitLabError>, kind: &str) -> Result<(), ControllerError> {
    match result {
        Err(e) if !is_not_found(&e) => Err(ControllerError::remote(format!("delete {kind}"), e)),
        _ => Ok(()),
    }
}
