//! Connectors: provider config → GitLab client → per-kind external client.
//!
//! A fresh client is built on every connect, so credential rotation takes
//! effect on the next reconcile.

use crate::config::{ConfigResolver, GitLabConfig};
use crate::error::ControllerError;
use crate::external::{Connector, ExternalClient};
use crate::reconciler::groups::{GroupExternal, LdapGroupLinkExternal, SamlGroupLinkExternal};
use crate::reconciler::projects::{
    AccessTokenExternal, ApprovalRuleExternal, DeployTokenExternal, HookExternal, MemberExternal,
    PipelineScheduleExternal, ProjectExternal, ProtectedBranchExternal, VariableExternal,
};
use crate::reconciler::runners::RunnerExternal;
use crate::secrets::SecretReader;
use async_trait::async_trait;
use crds::{
    AccessToken, ApprovalRule, CredentialsMethod, DeployToken, Group, Hook, LdapGroupLink, Managed,
    Member, PipelineSchedule, Project, ProtectedBranch, Runner, SamlGroupLink, Variable,
};
use gitlab_client::{AuthMethod, GitLabClient, GitLabClientTrait};
use std::sync::Arc;

/// Builds GitLab clients from resolved configs
pub trait ClientFactory: Send + Sync + 'static {
    type Client: GitLabClientTrait + 'static;

    fn build(&self, config: &GitLabConfig) -> Result<Self::Client, ControllerError>;
}

/// Factory for the REST client
#[derive(Debug, Clone, Copy, Default)]
pub struct RestClientFactory;

impl ClientFactory for RestClientFactory {
    type Client = GitLabClient;

    fn build(&self, config: &GitLabConfig) -> Result<GitLabClient, ControllerError> {
        let auth = match config.method {
            CredentialsMethod::PersonalAccessToken => AuthMethod::PrivateToken,
            CredentialsMethod::OAuthToken => AuthMethod::Bearer,
        };
        GitLabClient::new(config.base_url.clone(), config.token.clone(), config.insecure, auth)
            .map_err(|e| ControllerError::remote("create GitLab client", e))
    }
}

/// Shared inputs every external client may need
#[derive(Clone)]
pub struct ExternalContext {
    pub secrets: Arc<dyn SecretReader>,
    pub project_path_external_names: bool,
}

/// Connector for every GitLab kind
pub struct GitLabConnector<F> {
    resolver: Arc<ConfigResolver>,
    factory: Arc<F>,
    context: ExternalContext,
}

impl<F: ClientFactory> GitLabConnector<F> {
    pub fn new(resolver: Arc<ConfigResolver>, factory: Arc<F>, context: ExternalContext) -> Self {
        Self {
            resolver,
            factory,
            context,
        }
    }

    async fn client_for<K: Managed>(&self, cr: &K) -> Result<F::Client, ControllerError> {
        let config = self.resolver.resolve(cr).await?;
        self.factory.build(&config)
    }
}

macro_rules! connect_kinds {
    ($($kind:ty => $external:ident),* $(,)?) => {
        $(
            #[async_trait]
            impl<F: ClientFactory> Connector<$kind> for GitLabConnector<F> {
                async fn connect(&self, cr: &$kind) -> Result<Box<dyn ExternalClient<$kind>>, ControllerError> {
                    let client = self.client_for(cr).await?;
                    Ok(Box::new($external::new(client, self.context.clone())))
                }
            }
        )*
    };
}

connect_kinds! {
    Project => ProjectExternal,
    Hook => HookExternal,
    Variable => VariableExternal,
    Member => MemberExternal,
    DeployToken => DeployTokenExternal,
    AccessToken => AccessTokenExternal,
    ApprovalRule => ApprovalRuleExternal,
    ProtectedBranch => ProtectedBranchExternal,
    PipelineSchedule => PipelineScheduleExternal,
    Group => GroupExternal,
    SamlGroupLink => SamlGroupLinkExternal,
    LdapGroupLink => LdapGroupLinkExternal,
    Runner => RunnerExternal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{project_record, MemoryProviderConfigs, MemorySecrets, MockClientFactory};
    use crds::{CredentialsSource, ProviderConfigSpec, ProviderCredentials};
    use gitlab_client::{MockGitLabClient, Project as RemoteProject};

    #[test]
    fn rest_factory_builds_client() {
        let config = GitLabConfig {
            base_url: "https://gitlab.example.com".to_string(),
            token: "t".to_string(),
            insecure: false,
            method: CredentialsMethod::OAuthToken,
        };
        let client = RestClientFactory.build(&config).unwrap();
        assert!(client.base_url().starts_with("https://gitlab.example.com"));
    }

    #[tokio::test]
    async fn connect_resolves_config_and_observes() {
        let configs = MemoryProviderConfigs::default().with_cluster(
            "default",
            ProviderConfigSpec {
                base_url: "https://gitlab.example.com".to_string(),
                insecure: None,
                credentials: ProviderCredentials {
                    source: CredentialsSource::None,
                    method: CredentialsMethod::PersonalAccessToken,
                    secret_ref: None,
                    fs: None,
                    env: None,
                },
            },
        );
        let secrets: Arc<dyn SecretReader> = Arc::new(MemorySecrets::default());
        let mock = MockGitLabClient::new();
        mock.add_project(RemoteProject {
            id: 5,
            name: "demo".to_string(),
            ..Default::default()
        });
        let connector = GitLabConnector::new(
            Arc::new(ConfigResolver::new(Arc::new(configs), secrets.clone())),
            Arc::new(MockClientFactory(mock.clone())),
            ExternalContext {
                secrets,
                project_path_external_names: false,
            },
        );

        let mut cr = project_record("demo");
        cr.set_external_name("5");
        let external = Connector::<Project>::connect(&connector, &cr).await.unwrap();
        let observation = external.observe(&mut cr).await.unwrap();
        assert!(observation.resource_exists);
        assert_eq!(mock.operations(), vec!["get_project"]);
    }
}
