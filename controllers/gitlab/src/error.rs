//! Controller-specific error types.
//!
//! Local validation failures (missing identifiers, malformed external-names,
//! unreadable secrets) end the current attempt and are retried on the poll
//! schedule. GitLab and Kubernetes failures keep their cause so the watcher
//! can tell transient errors from permanent ones.

use gitlab_client::GitLabError;
use kube::Error as KubeError;
use thiserror::Error;

/// Errors that can occur in the GitLab Controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// A record of an unexpected kind was handed to a kind-specific path
    #[error("managed resource is not a {0}")]
    TypeMismatch(String),

    /// A required identifier (project ID, group ID, external-name) is unset
    #[error("{0} is missing")]
    MissingIdentifier(&'static str),

    /// An integer-keyed kind carries a non-numeric external-name
    #[error("ID is not an integer")]
    MalformedExternalName {
        /// The rejected external-name
        value: String,
    },

    /// Referenced secret does not exist
    #[error("cannot get secret {namespace}/{name}: secret not found")]
    SecretNotFound {
        /// Secret namespace
        namespace: String,
        /// Secret name
        name: String,
    },

    /// Referenced secret exists but lacks the key
    #[error("cannot get secret {namespace}/{name}: key {key} not found")]
    SecretKeyNotFound {
        /// Secret namespace
        namespace: String,
        /// Secret name
        name: String,
        /// Missing key
        key: String,
    },

    /// The record has no `providerConfigRef`
    #[error("providerConfigRef is not given")]
    ProviderConfigNotGiven,

    /// The provider config could not be loaded or is invalid
    #[error("cannot get provider config: {0}")]
    ProviderConfig(String),

    /// Credentials could not be read from their source
    #[error("cannot read credentials: {0}")]
    Credentials(String),

    /// A `*Ref` field could not be resolved
    #[error("cannot resolve reference: {0}")]
    Reference(String),

    /// GitLab API call failed
    #[error("cannot {action}: {source}")]
    Remote {
        /// What was attempted, e.g. `create Project`
        action: String,
        /// Underlying SDK error
        #[source]
        source: GitLabError,
    },

    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// JSON (de)serialization of a record failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),
}

impl ControllerError {
    /// Wrap a GitLab error with the action that failed
    pub fn remote(action: impl Into<String>, source: GitLabError) -> Self {
        Self::Remote {
            action: action.into(),
            source,
        }
    }

    /// Conflicts are retried almost immediately
    pub fn is_conflict(&self) -> bool {
        match self {
            Self::Remote { source, .. } => source.is_conflict(),
            Self::Kube(KubeError::Api(e)) => e.code == 409,
            _ => false,
        }
    }

    /// Network failures, 5xx, 409 and 429 are worth retrying with backoff
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Remote { source, .. } => source.is_transient(),
            Self::Kube(KubeError::Api(e)) => e.code == 409 || e.code == 429 || e.code >= 500,
            Self::Kube(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(status: u16) -> GitLabError {
        GitLabError::Api {
            method: "POST",
            path: "/projects".to_string(),
            status,
            message: "boom".to_string(),
        }
    }

    #[test]
    fn remote_message_names_action_and_cause() {
        let err = ControllerError::remote("create Project", api_error(400));
        assert_eq!(err.to_string(), "cannot create Project: POST /projects: 400 boom");
    }

    #[test]
    fn classification() {
        assert!(ControllerError::remote("update Hook", api_error(503)).is_transient());
        assert!(ControllerError::remote("update Hook", api_error(409)).is_conflict());
        assert!(!ControllerError::remote("update Hook", api_error(403)).is_transient());
        assert!(!ControllerError::ProviderConfigNotGiven.is_transient());
        assert!(
            !ControllerError::MalformedExternalName { value: "abc".to_string() }.is_transient()
        );
    }

    #[test]
    fn fixed_messages() {
        assert_eq!(ControllerError::MissingIdentifier("ProjectID").to_string(), "ProjectID is missing");
        assert_eq!(
            ControllerError::MalformedExternalName { value: "x".to_string() }.to_string(),
            "ID is not an integer"
        );
        assert_eq!(ControllerError::ProviderConfigNotGiven.to_string(), "providerConfigRef is not given");
    }
}
