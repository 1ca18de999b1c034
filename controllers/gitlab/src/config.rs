//! Config Resolver
//!
//! Turns a record's `providerConfigRef` into everything needed to build a
//! GitLab client, and records a `ProviderConfigUsage` so the config stays
//! in place while the record uses it.

use crate::error::ControllerError;
use crate::secrets::SecretReader;
use crate::store::FIELD_MANAGER;
use async_trait::async_trait;
use crds::{
    ClusterProviderConfig, CredentialsMethod, CredentialsSource, Managed, ProviderConfig,
    ProviderConfigKind, ProviderConfigReference, ProviderConfigSpec, ProviderConfigUsage,
    ProviderConfigUsageSpec, TypedReference, PROVIDER_CONFIG_KIND_LABEL, PROVIDER_CONFIG_LABEL,
};
use kube::api::{Patch, PatchParams};
use kube::{Api, Client, Resource, ResourceExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Everything needed to reach GitLab
#[derive(Clone, PartialEq, Eq)]
pub struct GitLabConfig {
    pub base_url: String,
    pub token: String,
    pub insecure: bool,
    pub method: CredentialsMethod,
}

impl std::fmt::Debug for GitLabConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitLabConfig")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("insecure", &self.insecure)
            .field("method", &self.method)
            .finish()
    }
}

/// A provider config as loaded from the cluster
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedProviderConfig {
    pub spec: ProviderConfigSpec,
    /// Namespace secret references are pinned to (namespaced configs only)
    pub secret_namespace: Option<String>,
}

/// Source of provider configs and sink for usages
#[async_trait]
pub trait ProviderConfigSource: Send + Sync {
    /// Load the config a reference points at; `namespace` is the record's
    async fn get(
        &self,
        reference: &ProviderConfigReference,
        namespace: &str,
    ) -> Result<LoadedProviderConfig, ControllerError>;

    /// Create or refresh a usage record
    async fn track_usage(&self, usage: &ProviderConfigUsage) -> Result<(), ControllerError>;
}

/// `ProviderConfigSource` backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeProviderConfigSource {
    client: Client,
}

impl KubeProviderConfigSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProviderConfigSource for KubeProviderConfigSource {
    async fn get(
        &self,
        reference: &ProviderConfigReference,
        namespace: &str,
    ) -> Result<LoadedProviderConfig, ControllerError> {
        let not_found = || {
            ControllerError::ProviderConfig(format!(
                "{} {} not found",
                reference.kind.as_str(),
                reference.name
            ))
        };
        match reference.kind {
            ProviderConfigKind::ClusterProviderConfig => {
                let api: Api<ClusterProviderConfig> = Api::all(self.client.clone());
                let pc = api.get_opt(&reference.name).await?.ok_or_else(not_found)?;
                Ok(LoadedProviderConfig {
                    spec: pc.spec.into(),
                    secret_namespace: None,
                })
            }
            ProviderConfigKind::ProviderConfig => {
                let api: Api<ProviderConfig> = Api::namespaced(self.client.clone(), namespace);
                let pc = api.get_opt(&reference.name).await?.ok_or_else(not_found)?;
                Ok(LoadedProviderConfig {
                    spec: pc.spec,
                    secret_namespace: Some(namespace.to_string()),
                })
            }
        }
    }

    async fn track_usage(&self, usage: &ProviderConfigUsage) -> Result<(), ControllerError> {
        let namespace = usage.namespace().unwrap_or_default();
        let api: Api<ProviderConfigUsage> = Api::namespaced(self.client.clone(), &namespace);
        api.patch(
            &usage.name_any(),
            &PatchParams::apply(FIELD_MANAGER).force(),
            &Patch::Apply(usage),
        )
        .await?;
        Ok(())
    }
}

/// The usage a record holds on its provider config
pub fn usage_for<K: Managed>(cr: &K, reference: &ProviderConfigReference) -> ProviderConfigUsage {
    let kind = K::kind(&()).to_string();
    let name = format!("{}-{}", kind.to_lowercase(), cr.name_any());
    let mut usage = ProviderConfigUsage::new(
        &name,
        ProviderConfigUsageSpec {
            provider_config_ref: reference.clone(),
            resource_ref: TypedReference {
                api_version: K::api_version(&()).to_string(),
                kind,
                name: cr.name_any(),
                uid: cr.uid(),
            },
        },
    );
    usage.metadata.namespace = cr.namespace();
    usage.metadata.labels = Some(BTreeMap::from([
        (PROVIDER_CONFIG_LABEL.to_string(), reference.name.clone()),
        (PROVIDER_CONFIG_KIND_LABEL.to_string(), reference.kind.as_str().to_string()),
    ]));
    usage.metadata.owner_references = cr.controller_owner_ref(&()).map(|owner| vec![owner]);
    usage
}

/// Resolves provider configs into `GitLabConfig`s
pub struct ConfigResolver {
    source: Arc<dyn ProviderConfigSource>,
    secrets: Arc<dyn SecretReader>,
}

impl ConfigResolver {
    pub fn new(source: Arc<dyn ProviderConfigSource>, secrets: Arc<dyn SecretReader>) -> Self {
        Self { source, secrets }
    }

    /// Resolve the record's provider config and record the usage
    pub async fn resolve<K: Managed>(&self, cr: &K) -> Result<GitLabConfig, ControllerError> {
        let reference = cr
            .resource_spec()
            .provider_config_ref
            .as_ref()
            .ok_or(ControllerError::ProviderConfigNotGiven)?;
        let namespace = cr.namespace().unwrap_or_default();
        let loaded = self.source.get(reference, &namespace).await?;
        self.source.track_usage(&usage_for(cr, reference)).await?;

        let token = self.read_credentials(&loaded).await?;
        debug!(
            provider_config = %reference.name,
            base_url = %loaded.spec.base_url,
            "resolved provider config"
        );
        Ok(GitLabConfig {
            base_url: loaded.spec.base_url,
            token,
            insecure: loaded.spec.insecure.unwrap_or(false),
            method: loaded.spec.credentials.method,
        })
    }

    async fn read_credentials(&self, loaded: &LoadedProviderConfig) -> Result<String, ControllerError> {
        let credentials = &loaded.spec.credentials;
        let token = match credentials.source {
            CredentialsSource::Secret => {
                let selector = credentials.secret_ref.as_ref().ok_or_else(|| {
                    ControllerError::Credentials("secretRef is required for source Secret".to_string())
                })?;
                let namespace = match (&loaded.secret_namespace, &selector.namespace) {
                    (Some(pinned), _) => pinned.as_str(),
                    (None, Some(namespace)) => namespace.as_str(),
                    (None, None) => {
                        return Err(ControllerError::Credentials(
                            "secretRef.namespace is required for ClusterProviderConfig".to_string(),
                        ));
                    }
                };
                let bytes = self.secrets.read(namespace, &selector.name, &selector.key).await?;
                String::from_utf8(bytes).map_err(|_| {
                    ControllerError::Credentials(format!("secret {namespace}/{} is not valid UTF-8", selector.name))
                })?
            }
            CredentialsSource::Filesystem => {
                let fs = credentials.fs.as_ref().ok_or_else(|| {
                    ControllerError::Credentials("fs is required for source Filesystem".to_string())
                })?;
                tokio::fs::read_to_string(&fs.path)
                    .await
                    .map_err(|e| ControllerError::Credentials(format!("{}: {e}", fs.path)))?
            }
            CredentialsSource::Environment => {
                let env = credentials.env.as_ref().ok_or_else(|| {
                    ControllerError::Credentials("env is required for source Environment".to_string())
                })?;
                std::env::var(&env.name)
                    .map_err(|e| ControllerError::Credentials(format!("{}: {e}", env.name)))?
            }
            CredentialsSource::None => String::new(),
        };
        Ok(token.trim_end().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{project_record, MemoryProviderConfigs, MemorySecrets};
    use crds::{FsSelector, ProviderCredentials, SecretKeySelector};

    fn secret_spec(namespace: Option<&str>) -> ProviderConfigSpec {
        ProviderConfigSpec {
            base_url: "https://gitlab.example.com".to_string(),
            insecure: Some(true),
            credentials: ProviderCredentials {
                source: CredentialsSource::Secret,
                method: CredentialsMethod::OAuthToken,
                secret_ref: Some(SecretKeySelector {
                    name: "gitlab-creds".to_string(),
                    namespace: namespace.map(str::to_string),
                    key: "token".to_string(),
                }),
                fs: None,
                env: None,
            },
        }
    }

    fn resolver(configs: MemoryProviderConfigs, secrets: MemorySecrets) -> (ConfigResolver, Arc<MemoryProviderConfigs>) {
        let configs = Arc::new(configs);
        (ConfigResolver::new(configs.clone(), Arc::new(secrets)), configs)
    }

    #[tokio::test]
    async fn missing_reference_is_reported() {
        let (resolver, _) = resolver(MemoryProviderConfigs::default(), MemorySecrets::default());
        let mut cr = project_record("demo");
        cr.spec.resource.provider_config_ref = None;
        let err = resolver.resolve(&cr).await.unwrap_err();
        assert_eq!(err.to_string(), "providerConfigRef is not given");
    }

    #[tokio::test]
    async fn cluster_config_reads_secret_and_records_usage() {
        let configs = MemoryProviderConfigs::default().with_cluster("default", secret_spec(Some("crossplane-system")));
        let secrets = MemorySecrets::default().with("crossplane-system", "gitlab-creds", "token", "glpat-abc\n");
        let (resolver, configs) = resolver(configs, secrets);

        let config = resolver.resolve(&project_record("demo")).await.unwrap();
        assert_eq!(config.base_url, "https://gitlab.example.com");
        assert_eq!(config.token, "glpat-abc");
        assert!(config.insecure);
        assert_eq!(config.method, CredentialsMethod::OAuthToken);

        let usages = configs.usages();
        assert_eq!(usages.len(), 1);
        assert_eq!(usages[0].metadata.name.as_deref(), Some("project-demo"));
        assert_eq!(usages[0].spec.resource_ref.kind, "Project");
        assert_eq!(
            usages[0].metadata.labels.as_ref().unwrap()[PROVIDER_CONFIG_LABEL],
            "default"
        );
    }

    #[tokio::test]
    async fn cluster_config_needs_secret_namespace() {
        let configs = MemoryProviderConfigs::default().with_cluster("default", secret_spec(None));
        let (resolver, _) = resolver(configs, MemorySecrets::default());
        let err = resolver.resolve(&project_record("demo")).await.unwrap_err();
        assert!(matches!(err, ControllerError::Credentials(_)));
    }

    #[tokio::test]
    async fn namespaced_config_pins_secret_namespace() {
        let configs = MemoryProviderConfigs::default().with_namespaced("default", "team", secret_spec(Some("other")));
        let secrets = MemorySecrets::default().with("default", "gitlab-creds", "token", "scoped");
        let (resolver, _) = resolver(configs, secrets);

        let mut cr = project_record("demo");
        cr.spec.resource.provider_config_ref = Some(ProviderConfigReference::namespaced("team"));
        assert_eq!(resolver.resolve(&cr).await.unwrap().token, "scoped");
    }

    #[tokio::test]
    async fn unknown_config_fails() {
        let (resolver, _) = resolver(MemoryProviderConfigs::default(), MemorySecrets::default());
        let err = resolver.resolve(&project_record("demo")).await.unwrap_err();
        assert!(matches!(err, ControllerError::ProviderConfig(_)));
    }

    #[tokio::test]
    async fn filesystem_credentials() {
        let path = std::env::temp_dir().join(format!("gitlab-token-{}", std::process::id()));
        std::fs::write(&path, "from-file\n").unwrap();
        let mut spec = secret_spec(None);
        spec.credentials.source = CredentialsSource::Filesystem;
        spec.credentials.fs = Some(FsSelector {
            path: path.display().to_string(),
        });
        let configs = MemoryProviderConfigs::default().with_cluster("default", spec);
        let (resolver, _) = resolver(configs, MemorySecrets::default());
        assert_eq!(resolver.resolve(&project_record("demo")).await.unwrap().token, "from-file");
        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn anonymous_credentials() {
        let mut spec = secret_spec(None);
        spec.credentials.source = CredentialsSource::None;
        let configs = MemoryProviderConfigs::default().with_cluster("default", spec);
        let (resolver, _) = resolver(configs, MemorySecrets::default());
        assert_eq!(resolver.resolve(&project_record("demo")).await.unwrap().token, "");
    }

    #[test]
    fn debug_redacts_token() {
        let config = GitLabConfig {
            base_url: "https://gitlab.example.com".to_string(),
            token: "glpat-secret".to_string(),
            insecure: false,
            method: CredentialsMethod::PersonalAccessToken,
        };
        assert!(!format!("{config:?}").contains("glpat-secret"));
    }
}
