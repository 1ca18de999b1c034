//! Object references shared by managed resources
//!
//! Managed resources point at three kinds of objects: the provider config that
//! holds GitLab credentials, Kubernetes secrets (inputs and connection-detail
//! outputs), and other managed resources whose external-name supplies an ID
//! (`projectIdRef`, `groupIdRef`, ...).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Which provider config kind a reference points at
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum ProviderConfigKind {
    /// Cluster scoped `ClusterProviderConfig`
    #[default]
    ClusterProviderConfig,
    /// Namespaced `ProviderConfig`, looked up in the managed resource's namespace
    ProviderConfig,
}

impl ProviderConfigKind {
    /// Kind name as it appears in `kind:`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClusterProviderConfig => "ClusterProviderConfig",
            Self::ProviderConfig => "ProviderConfig",
        }
    }
}

/// Reference to the provider config used to reach GitLab
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfigReference {
    /// Name of the provider config
    pub name: String,

    /// Kind of the provider config (defaults to ClusterProviderConfig)
    #[serde(default)]
    pub kind: ProviderConfigKind,
}

impl ProviderConfigReference {
    /// Reference a cluster scoped provider config
    pub fn cluster(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ProviderConfigKind::ClusterProviderConfig,
        }
    }

    /// Reference a namespaced provider config
    pub fn namespaced(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ProviderConfigKind::ProviderConfig,
        }
    }
}

/// Reference to a secret (connection-detail target)
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SecretReference {
    /// Name of the secret
    pub name: String,

    /// Namespace of the secret (defaults to the managed resource's namespace)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Selects one key of a secret
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SecretKeySelector {
    /// Name of the secret
    pub name: String,

    /// Namespace of the secret (defaults to the managed resource's namespace)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// Key within the secret's data
    pub key: String,
}

impl SecretKeySelector {
    /// Namespace to read from, falling back to `default_namespace`
    pub fn namespace_or<'a>(&'a self, default_namespace: &'a str) -> &'a str {
        self.namespace.as_deref().unwrap_or(default_namespace)
    }
}

/// Reference to another managed resource by name
///
/// The referenced resource's external-name is copied into the matching ID
/// field before reconciliation runs.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceReference {
    /// Name of the referenced resource
    pub name: String,

    /// Namespace of the referenced resource (defaults to the referencing resource's namespace)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl ResourceReference {
    /// Create a same-namespace reference
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
        }
    }
}

/// Fully typed reference to a managed resource, recorded in usages
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TypedReference {
    /// API version of the referenced resource
    pub api_version: String,

    /// Kind of the referenced resource
    pub kind: String,

    /// Name of the referenced resource
    pub name: String,

    /// UID of the referenced resource
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_config_kind_defaults_to_cluster() {
        let r: ProviderConfigReference = serde_json::from_str(r#"{"name":"default"}"#).unwrap();
        assert_eq!(r, ProviderConfigReference::cluster("default"));
    }

    #[test]
    fn secret_selector_namespace_fallback() {
        let s = SecretKeySelector {
            name: "s".to_string(),
            namespace: None,
            key: "k".to_string(),
        };
        assert_eq!(s.namespace_or("team-a"), "team-a");
    }
}
