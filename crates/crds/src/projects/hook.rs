//! Hook CRD
//!
//! A project webhook. The external-name is the numeric hook ID.

use crate::managed::{ResourceSpec, ResourceStatus};
use crate::references::{ResourceReference, SecretKeySelector};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "projects.gitlab.crossplane.io",
    version = "v1alpha1",
    kind = "Hook",
    namespaced,
    status = "HookStatus",
    category = "crossplane",
    category = "managed",
    category = "gitlab",
    printcolumn = r#"{"name":"READY","type":"string","jsonPath":".status.conditions[?(@.type=='Ready')].status"}"#,
    printcolumn = r#"{"name":"SYNCED","type":"string","jsonPath":".status.conditions[?(@.type=='Synced')].status"}"#,
    printcolumn = r#"{"name":"EXTERNAL-NAME","type":"string","jsonPath":".metadata.annotations.crossplane\\.io/external-name"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct HookSpec {
    #[serde(flatten)]
    pub resource: ResourceSpec,

    pub for_provider: HookParameters,
}

/// Desired state of a project hook
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HookParameters {
    /// Project the hook belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,

    /// Project resource supplying `projectId`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id_ref: Option<ResourceReference>,

    /// Hook URL
    pub url: String,

    /// Secret token GitLab sends in `X-Gitlab-Token`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_secret_ref: Option<SecretKeySelector>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_events: Option<bool>,

    /// Only fire push events for matching branches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_events_branch_filter: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issues_events: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidential_issues_events: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_requests_events: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_push_events: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note_events: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidential_note_events: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_events: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_events: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wiki_page_events: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_events: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub releases_events: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_ssl_verification: Option<bool>,
}

/// Observed hook state
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HookObservation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// RFC 3339
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HookStatus {
    #[serde(flatten)]
    pub resource: ResourceStatus,

    #[serde(default)]
    pub at_provider: HookObservation,
}

crate::impl_managed!(Hook, HookStatus);
