//! Secret Reader
//!
//! Reads single keys out of Kubernetes secrets. Secrets are read fresh on
//! every reconcile and never cached.

use crate::error::ControllerError;
use async_trait::async_trait;
use crds::SecretKeySelector;
use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client};
use tracing::debug;

/// Read access to secret keys
#[async_trait]
pub trait SecretReader: Send + Sync {
    /// Bytes stored under `key` in secret `namespace/name`
    async fn read(&self, namespace: &str, name: &str, key: &str) -> Result<Vec<u8>, ControllerError>;
}

/// Read the value a selector points at, defaulting its namespace
pub async fn read_selector(
    reader: &dyn SecretReader,
    selector: &SecretKeySelector,
    default_namespace: &str,
) -> Result<String, ControllerError> {
    let namespace = selector.namespace_or(default_namespace);
    let bytes = reader.read(namespace, &selector.name, &selector.key).await?;
    String::from_utf8(bytes).map_err(|_| {
        ControllerError::Credentials(format!(
            "secret {namespace}/{} key {} is not valid UTF-8",
            selector.name, selector.key
        ))
    })
}

/// `SecretReader` backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeSecretReader {
    client: Client,
}

impl KubeSecretReader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretReader for KubeSecretReader {
    async fn read(&self, namespace: &str, name: &str, key: &str) -> Result<Vec<u8>, ControllerError> {
        debug!(namespace, name, key, "reading secret key");
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let secret = api
            .get_opt(name)
            .await?
            .ok_or_else(|| ControllerError::SecretNotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })?;
        secret
            .data
            .and_then(|mut data| data.remove(key))
            .map(|value| value.0)
            .ok_or_else(|| ControllerError::SecretKeyNotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
                key: key.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MemorySecrets;

    fn selector(namespace: Option<&str>) -> SecretKeySelector {
        SecretKeySelector {
            name: "creds".to_string(),
            namespace: namespace.map(str::to_string),
            key: "token".to_string(),
        }
    }

    #[tokio::test]
    async fn selector_defaults_to_record_namespace() {
        let secrets = MemorySecrets::default().with("team-a", "creds", "token", "abc");
        let value = read_selector(&secrets, &selector(None), "team-a").await.unwrap();
        assert_eq!(value, "abc");
    }

    #[tokio::test]
    async fn explicit_namespace_wins() {
        let secrets = MemorySecrets::default().with("shared", "creds", "token", "xyz");
        let value = read_selector(&secrets, &selector(Some("shared")), "team-a").await.unwrap();
        assert_eq!(value, "xyz");
    }

    #[tokio::test]
    async fn missing_secret_and_missing_key_are_distinct() {
        let secrets = MemorySecrets::default().with("team-a", "creds", "other", "abc");
        let missing_key = read_selector(&secrets, &selector(None), "team-a").await.unwrap_err();
        assert!(matches!(missing_key, ControllerError::SecretKeyNotFound { .. }));

        let missing_secret = read_selector(&secrets, &selector(None), "team-b").await.unwrap_err();
        assert!(matches!(missing_secret, ControllerError::SecretNotFound { .. }));
    }
}
