//! ProviderConfig, ClusterProviderConfig and ProviderConfigUsage CRDs
//!
//! A provider config names a GitLab instance and where to find the API token.
//! Every managed resource that connects through a provider config records a
//! `ProviderConfigUsage`, owned by the managed resource, so the config cannot
//! be deleted while something still uses it.

use crate::managed::Condition;
use crate::references::{ProviderConfigReference, SecretKeySelector, TypedReference};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Finalizer held on a provider config while usages exist
pub const IN_USE_FINALIZER: &str = "in-use.crossplane.io";

/// Label on usages naming the provider config they point at
pub const PROVIDER_CONFIG_LABEL: &str = "gitlab.crossplane.io/provider-config";

/// Label on usages naming the kind of provider config they point at
pub const PROVIDER_CONFIG_KIND_LABEL: &str = "gitlab.crossplane.io/provider-config-kind";

/// Where the API token comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum CredentialsSource {
    /// A key of a Kubernetes secret
    Secret,
    /// A file on the controller's filesystem
    Filesystem,
    /// An environment variable of the controller
    Environment,
    /// Anonymous access
    None,
}

/// How the token is sent to GitLab
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum CredentialsMethod {
    /// `PRIVATE-TOKEN` header
    #[default]
    PersonalAccessToken,
    /// `Authorization: Bearer` header
    OAuthToken,
}

/// Filesystem credentials location
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct FsSelector {
    /// Path of the file holding the token
    pub path: String,
}

/// Environment credentials location
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct EnvSelector {
    /// Name of the environment variable holding the token
    pub name: String,
}

/// Credentials for the GitLab API
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCredentials {
    /// Credentials source
    pub source: CredentialsSource,

    /// Token type (defaults to PersonalAccessToken)
    #[serde(default)]
    pub method: CredentialsMethod,

    /// Secret key holding the token (source: Secret)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<SecretKeySelector>,

    /// File holding the token (source: Filesystem)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs: Option<FsSelector>,

    /// Environment variable holding the token (source: Environment)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<EnvSelector>,
}

/// Namespaced provider config
///
/// Secret references resolve inside the config's own namespace.
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "gitlab.crossplane.io",
    version = "v1beta1",
    kind = "ProviderConfig",
    namespaced,
    status = "ProviderConfigStatus",
    category = "crossplane",
    category = "provider",
    category = "gitlab",
    printcolumn = r#"{"name":"USERS","type":"integer","jsonPath":".status.users"}"#,
    printcolumn = r#"{"name":"BASE-URL","type":"string","jsonPath":".spec.baseURL"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfigSpec {
    /// GitLab base URL, e.g. `https://gitlab.example.com`
    #[serde(rename = "baseURL")]
    pub base_url: String,

    /// Skip TLS certificate verification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    /// API credentials
    pub credentials: ProviderCredentials,
}

/// Cluster scoped provider config
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "gitlab.crossplane.io",
    version = "v1beta1",
    kind = "ClusterProviderConfig",
    status = "ProviderConfigStatus",
    category = "crossplane",
    category = "provider",
    category = "gitlab",
    printcolumn = r#"{"name":"USERS","type":"integer","jsonPath":".status.users"}"#,
    printcolumn = r#"{"name":"BASE-URL","type":"string","jsonPath":".spec.baseURL"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterProviderConfigSpec {
    /// GitLab base URL, e.g. `https://gitlab.example.com`
    #[serde(rename = "baseURL")]
    pub base_url: String,

    /// Skip TLS certificate verification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    /// API credentials
    pub credentials: ProviderCredentials,
}

impl From<ClusterProviderConfigSpec> for ProviderConfigSpec {
    fn from(spec: ClusterProviderConfigSpec) -> Self {
        Self {
            base_url: spec.base_url,
            insecure: spec.insecure,
            credentials: spec.credentials,
        }
    }
}

/// Provider config status
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfigStatus {
    /// Number of managed resources using this config
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users: Option<i64>,

    /// Conditions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

/// Records that a managed resource uses a provider config
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "gitlab.crossplane.io",
    version = "v1beta1",
    kind = "ProviderConfigUsage",
    namespaced,
    category = "crossplane",
    category = "provider",
    category = "gitlab",
    printcolumn = r#"{"name":"CONFIG-NAME","type":"string","jsonPath":".spec.providerConfigRef.name"}"#,
    printcolumn = r#"{"name":"RESOURCE-KIND","type":"string","jsonPath":".spec.resourceRef.kind"}"#,
    printcolumn = r#"{"name":"RESOURCE-NAME","type":"string","jsonPath":".spec.resourceRef.name"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfigUsageSpec {
    /// Provider config in use
    pub provider_config_ref: ProviderConfigReference,

    /// Managed resource using it
    pub resource_ref: TypedReference,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_secret_credentials() {
        let spec: ProviderConfigSpec = serde_json::from_value(serde_json::json!({
            "baseURL": "https://gitlab.example.com",
            "credentials": {
                "source": "Secret",
                "secretRef": {"name": "gitlab", "namespace": "crossplane-system", "key": "token"}
            }
        }))
        .unwrap();
        assert_eq!(spec.credentials.source, CredentialsSource::Secret);
        assert_eq!(spec.credentials.method, CredentialsMethod::PersonalAccessToken);
        assert_eq!(spec.credentials.secret_ref.unwrap().key, "token");
        assert_eq!(spec.insecure, None);
    }

    #[test]
    fn cluster_spec_converts() {
        let spec = ClusterProviderConfigSpec {
            base_url: "https://gitlab.com".to_string(),
            insecure: Some(true),
            credentials: ProviderCredentials {
                source: CredentialsSource::None,
                method: CredentialsMethod::OAuthToken,
                secret_ref: None,
                fs: None,
                env: None,
            },
        };
        let converted = ProviderConfigSpec::from(spec);
        assert_eq!(converted.base_url, "https://gitlab.com");
        assert_eq!(converted.credentials.method, CredentialsMethod::OAuthToken);
    }
}
