//! Main controller implementation.
//!
//! Wires the shared collaborators (config resolver, secret reader, reference
//! lookup, record store) into one watcher per kind and runs them until one
//! stops. Registered kinds:
//! - Project and everything scoped under a project
//! - Group, SamlGroupLink, LdapGroupLink
//! - Runner
//! - ClusterProviderConfig and ProviderConfig (usage tracking)

use crate::config::{ConfigResolver, KubeProviderConfigSource};
use crate::connector::{ExternalContext, GitLabConnector, RestClientFactory};
use crate::engine::{EngineSettings, ManagedReconciler};
use crate::error::ControllerError;
use crate::external::Connector;
use crate::options::ControllerOptions;
use crate::references::{KubeReferenceLookup, ResolveReferences};
use crate::secrets::{KubeSecretReader, SecretReader};
use crate::store::KubeRecordStore;
use crate::usage::{ProviderConfigRecord, UsageTracker};
use crate::watcher::{wait_for_crd, watch_resource, Reconcile, WatchSettings};
use crds::{
    AccessToken, ApprovalRule, ClusterProviderConfig, DeployToken, Group, Hook, LdapGroupLink, Managed,
    Member, PipelineSchedule, Project, ProtectedBranch, ProviderConfig, Runner, SamlGroupLink, Variable,
};
use futures::future::select_all;
use kube::{Api, Client, CustomResourceExt, Resource};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

type Watcher = JoinHandle<Result<(), ControllerError>>;

/// Main controller for GitLab resource management.
pub struct Controller {
    client: Client,
    options: ControllerOptions,
    connector: Arc<GitLabConnector<RestClientFactory>>,
    references: Arc<KubeReferenceLookup>,
}

impl Controller {
    /// Creates a new controller instance.
    pub async fn new(options: ControllerOptions) -> Result<Self, ControllerError> {
        info!("Initializing GitLab controller");
        let client = Client::try_default().await?;

        let secrets: Arc<dyn SecretReader> = Arc::new(KubeSecretReader::new(client.clone()));
        let resolver = Arc::new(ConfigResolver::new(
            Arc::new(KubeProviderConfigSource::new(client.clone())),
            Arc::clone(&secrets),
        ));
        let connector = Arc::new(GitLabConnector::new(
            resolver,
            Arc::new(RestClientFactory),
            ExternalContext {
                secrets,
                project_path_external_names: options.project_path_external_names,
            },
        ));

        Ok(Self {
            references: Arc::new(KubeReferenceLookup::new(client.clone())),
            client,
            options,
            connector,
        })
    }

    fn settings(&self) -> WatchSettings {
        WatchSettings {
            poll_interval: self.options.poll_interval,
            concurrency: self.options.max_concurrent_reconciles,
        }
    }

    fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            poll_interval: self.options.poll_interval,
            management_policies_enabled: self.options.enable_management_policies,
            ..EngineSettings::default()
        }
    }

    /// Spawn the watcher for one managed kind
    fn managed<K>(&self) -> Watcher
    where
        K: Managed + ResolveReferences + CustomResourceExt,
        GitLabConnector<RestClientFactory>: Connector<K>,
    {
        let api: Api<K> = match &self.options.watch_namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        };
        let connector: Arc<dyn Connector<K>> = Arc::clone(&self.connector) as Arc<dyn Connector<K>>;
        let reconciler = Arc::new(ManagedReconciler::new(
            connector,
            Arc::new(KubeRecordStore::<K>::new(self.client.clone())),
            Arc::clone(&self.references) as _,
            self.engine_settings(),
        ));
        self.spawn(api, reconciler, K::crd_name())
    }

    /// Spawn the usage tracker for one provider config kind
    fn provider_configs<P>(&self) -> Watcher
    where
        P: ProviderConfigRecord + CustomResourceExt,
    {
        let api: Api<P> = Api::all(self.client.clone());
        let tracker = Arc::new(UsageTracker::<P>::new(self.client.clone(), self.options.poll_interval));
        self.spawn(api, tracker, P::crd_name())
    }

    fn spawn<K, R>(&self, api: Api<K>, reconciler: Arc<R>, crd_name: &'static str) -> Watcher
    where
        K: Resource<DynamicType = ()> + Clone + Debug + DeserializeOwned + Send + Sync + 'static,
        R: Reconcile<K>,
    {
        let client = self.client.clone();
        let gated = self.options.enable_crd_gating;
        let settings = self.settings();
        tokio::spawn(async move {
            if gated {
                wait_for_crd(client, crd_name).await?;
            }
            watch_resource(api, reconciler, settings).await
        })
    }

    /// Run every watcher until one of them stops
    pub async fn run(self) -> Result<(), ControllerError> {
        let watchers = vec![
            self.provider_configs::<ClusterProviderConfig>(),
            self.provider_configs::<ProviderConfig>(),
            self.managed::<Project>(),
            self.managed::<Hook>(),
            self.managed::<Variable>(),
            self.managed::<Member>(),
            self.managed::<DeployToken>(),
            self.managed::<AccessToken>(),
            self.managed::<ApprovalRule>(),
            self.managed::<ProtectedBranch>(),
            self.managed::<PipelineSchedule>(),
            self.managed::<Group>(),
            self.managed::<SamlGroupLink>(),
            self.managed::<LdapGroupLink>(),
            self.managed::<Runner>(),
        ];
        info!(watchers = watchers.len(), "GitLab controller started");

        let (finished, index, _remaining) = select_all(watchers).await;
        match finished {
            Ok(Ok(())) => {
                error!(index, "watcher exited");
                Err(ControllerError::Watch(format!("watcher {index} exited")))
            }
            Ok(Err(e)) => {
                error!(index, error = %e, "watcher failed");
                Err(e)
            }
            Err(e) => {
                error!(index, error = %e, "watcher task panicked");
                Err(ControllerError::Watch(e.to_string()))
            }
        }
    }
}
