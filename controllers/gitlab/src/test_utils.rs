//! Test utilities for unit testing reconcilers
//!
//! In-memory stand-ins for every Kubernetes-facing seam, plus record builders.

use crate::config::{GitLabConfig, LoadedProviderConfig, ProviderConfigSource};
use crate::connector::{ClientFactory, ExternalContext};
use crate::error::ControllerError;
use crate::external::ConnectionDetails;
use crate::references::{ReferenceLookup, ReferencedKind};
use crate::secrets::SecretReader;
use crate::store::{with_finalizer, without_finalizer, RecordStore};
use async_trait::async_trait;
use crds::{
    Managed, Project, ProjectParameters, ProjectSpec, ProviderConfigKind, ProviderConfigReference,
    ProviderConfigSpec, ProviderConfigUsage, ResourceSpec, MANAGED_FINALIZER,
};
use gitlab_client::MockGitLabClient;
use kube::ResourceExt;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Give a record the namespace and UID the API server would
pub fn record<K: Managed>(mut cr: K) -> K {
    let name = cr.name_any();
    cr.meta_mut().namespace = Some("default".to_string());
    cr.meta_mut().uid = Some(format!("uid-{name}"));
    cr.meta_mut().generation = Some(1);
    cr
}

/// Project record pointing at the `default` cluster provider config
pub fn project_record(name: &str) -> Project {
    record(Project::new(
        name,
        ProjectSpec {
            resource: ResourceSpec {
                provider_config_ref: Some(ProviderConfigReference::cluster("default")),
                ..Default::default()
            },
            for_provider: ProjectParameters::default(),
        },
    ))
}

/// Context for external clients under test
pub fn context(secrets: MemorySecrets) -> ExternalContext {
    ExternalContext {
        secrets: Arc::new(secrets),
        project_path_external_names: false,
    }
}

/// Secrets held in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySecrets {
    data: HashMap<(String, String, String), Vec<u8>>,
}

impl MemorySecrets {
    pub fn with(mut self, namespace: &str, name: &str, key: &str, value: &str) -> Self {
        self.data.insert(
            (namespace.to_string(), name.to_string(), key.to_string()),
            value.as_bytes().to_vec(),
        );
        self
    }
}

#[async_trait]
impl SecretReader for MemorySecrets {
    async fn read(&self, namespace: &str, name: &str, key: &str) -> Result<Vec<u8>, ControllerError> {
        if let Some(value) = self
            .data
            .get(&(namespace.to_string(), name.to_string(), key.to_string()))
        {
            return Ok(value.clone());
        }
        let secret_exists = self
            .data
            .keys()
            .any(|(ns, n, _)| ns == namespace && n == name);
        if secret_exists {
            Err(ControllerError::SecretKeyNotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
                key: key.to_string(),
            })
        } else {
            Err(ControllerError::SecretNotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
        }
    }
}

/// Provider configs held in memory; usages are recorded
#[derive(Debug, Default)]
pub struct MemoryProviderConfigs {
    cluster: HashMap<String, ProviderConfigSpec>,
    namespaced: HashMap<(String, String), ProviderConfigSpec>,
    usages: Mutex<Vec<ProviderConfigUsage>>,
}

impl MemoryProviderConfigs {
    pub fn with_cluster(mut self, name: &str, spec: ProviderConfigSpec) -> Self {
        self.cluster.insert(name.to_string(), spec);
        self
    }

    pub fn with_namespaced(mut self, namespace: &str, name: &str, spec: ProviderConfigSpec) -> Self {
        self.namespaced
            .insert((namespace.to_string(), name.to_string()), spec);
        self
    }

    pub fn usages(&self) -> Vec<ProviderConfigUsage> {
        self.usages.lock().map(|u| u.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ProviderConfigSource for MemoryProviderConfigs {
    async fn get(
        &self,
        reference: &ProviderConfigReference,
        namespace: &str,
    ) -> Result<LoadedProviderConfig, ControllerError> {
        let found = match reference.kind {
            ProviderConfigKind::ClusterProviderConfig => self
                .cluster
                .get(&reference.name)
                .map(|spec| LoadedProviderConfig {
                    spec: spec.clone(),
                    secret_namespace: None,
                }),
            ProviderConfigKind::ProviderConfig => self
                .namespaced
                .get(&(namespace.to_string(), reference.name.clone()))
                .map(|spec| LoadedProviderConfig {
                    spec: spec.clone(),
                    secret_namespace: Some(namespace.to_string()),
                }),
        };
        found.ok_or_else(|| {
            ControllerError::ProviderConfig(format!(
                "{} {} not found",
                reference.kind.as_str(),
                reference.name
            ))
        })
    }

    async fn track_usage(&self, usage: &ProviderConfigUsage) -> Result<(), ControllerError> {
        if let Ok(mut usages) = self.usages.lock() {
            usages.retain(|u| u.metadata.name != usage.metadata.name);
            usages.push(usage.clone());
        }
        Ok(())
    }
}

/// External-names of referenced resources held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryReferences {
    names: HashMap<(ReferencedKind, String, String), String>,
}

impl MemoryReferences {
    pub fn with(mut self, kind: ReferencedKind, namespace: &str, name: &str, external_name: &str) -> Self {
        self.names.insert(
            (kind, namespace.to_string(), name.to_string()),
            external_name.to_string(),
        );
        self
    }
}

#[async_trait]
impl ReferenceLookup for MemoryReferences {
    async fn external_name(
        &self,
        kind: ReferencedKind,
        namespace: &str,
        name: &str,
    ) -> Result<Option<String>, ControllerError> {
        Ok(self
            .names
            .get(&(kind, namespace.to_string(), name.to_string()))
            .cloned())
    }
}

/// A write made through `MemoryStore`
#[derive(Debug, Clone, PartialEq)]
pub enum StoreWrite {
    AddFinalizer,
    RemoveFinalizer,
    /// External-name at the time of the write
    Record(String),
    Status,
    Connection(ConnectionDetails),
}

/// Record store that keeps every write in memory
#[derive(Debug)]
pub struct MemoryStore<K> {
    writes: Mutex<Vec<StoreWrite>>,
    last: Mutex<Option<K>>,
}

impl<K> Default for MemoryStore<K> {
    fn default() -> Self {
        Self {
            writes: Mutex::new(Vec::new()),
            last: Mutex::new(None),
        }
    }
}

impl<K: Managed> MemoryStore<K> {
    pub fn writes(&self) -> Vec<StoreWrite> {
        self.writes.lock().map(|w| w.clone()).unwrap_or_default()
    }

    /// Record as of the last status or record write
    pub fn last(&self) -> Option<K> {
        self.last.lock().ok().and_then(|l| l.clone())
    }

    fn push(&self, write: StoreWrite, cr: Option<&K>) {
        if let Ok(mut writes) = self.writes.lock() {
            writes.push(write);
        }
        if let (Some(cr), Ok(mut last)) = (cr, self.last.lock()) {
            *last = Some(cr.clone());
        }
    }
}

#[async_trait]
impl<K: Managed> RecordStore<K> for MemoryStore<K> {
    async fn add_finalizer(&self, cr: &mut K) -> Result<(), ControllerError> {
        if let Some(finalizers) = with_finalizer(cr.finalizers(), MANAGED_FINALIZER) {
            cr.meta_mut().finalizers = Some(finalizers);
            self.push(StoreWrite::AddFinalizer, None);
        }
        Ok(())
    }

    async fn remove_finalizer(&self, cr: &mut K) -> Result<(), ControllerError> {
        if let Some(finalizers) = without_finalizer(cr.finalizers(), MANAGED_FINALIZER) {
            cr.meta_mut().finalizers = Some(finalizers);
            self.push(StoreWrite::RemoveFinalizer, None);
        }
        Ok(())
    }

    async fn update_record(&self, cr: &mut K) -> Result<(), ControllerError> {
        self.push(StoreWrite::Record(cr.external_name().to_string()), Some(cr));
        Ok(())
    }

    async fn update_status(&self, cr: &mut K) -> Result<(), ControllerError> {
        let generation = cr.meta().generation;
        cr.resource_status_mut().observed_generation = generation;
        self.push(StoreWrite::Status, Some(cr));
        Ok(())
    }

    async fn publish_connection_details(
        &self,
        cr: &K,
        details: &ConnectionDetails,
    ) -> Result<(), ControllerError> {
        if !details.is_empty() && cr.resource_spec().write_connection_secret_to_ref.is_some() {
            self.push(StoreWrite::Connection(details.clone()), None);
        }
        Ok(())
    }
}

/// Factory handing out clones of one mock client
#[derive(Debug, Clone)]
pub struct MockClientFactory(pub MockGitLabClient);

impl ClientFactory for MockClientFactory {
    type Client = MockGitLabClient;

    fn build(&self, _config: &GitLabConfig) -> Result<MockGitLabClient, ControllerError> {
        Ok(self.0.clone())
    }
}
