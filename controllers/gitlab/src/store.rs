//! Record store
//!
//! Every write the engine makes to the Kubernetes side goes through
//! `RecordStore`: finalizers, spec and annotation updates, status and the
//! connection secret. Spec writes carry the record's `resourceVersion`, so a
//! stale write fails with a conflict and is retried.

use crate::error::ControllerError;
use crate::external::ConnectionDetails;
use async_trait::async_trait;
use crds::{Managed, MANAGED_FINALIZER};
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client, ResourceExt};
use serde_json::json;
use std::marker::PhantomData;
use tracing::debug;

/// Field manager used for server-side apply
pub const FIELD_MANAGER: &str = "gitlab-controller";

/// Secret type of published connection details
pub const CONNECTION_SECRET_TYPE: &str = "connection.crossplane.io/v1alpha1";

/// Writes the engine makes to a record of kind `K`
#[async_trait]
pub trait RecordStore<K: Managed>: Send + Sync {
    /// Ensure the managed finalizer is present
    async fn add_finalizer(&self, cr: &mut K) -> Result<(), ControllerError>;

    /// Ensure the managed finalizer is absent
    async fn remove_finalizer(&self, cr: &mut K) -> Result<(), ControllerError>;

    /// Persist annotations (external-name) and spec
    async fn update_record(&self, cr: &mut K) -> Result<(), ControllerError>;

    /// Persist status
    async fn update_status(&self, cr: &mut K) -> Result<(), ControllerError>;

    /// Write connection details to the record's connection secret
    async fn publish_connection_details(
        &self,
        cr: &K,
        details: &ConnectionDetails,
    ) -> Result<(), ControllerError>;
}

/// Finalizer list with `finalizer` added, or `None` if already there
pub fn with_finalizer(finalizers: &[String], finalizer: &str) -> Option<Vec<String>> {
    if finalizers.iter().any(|f| f == finalizer) {
        return None;
    }
    let mut updated = finalizers.to_vec();
    updated.push(finalizer.to_string());
    Some(updated)
}

/// Finalizer list with `finalizer` removed, or `None` if absent
pub fn without_finalizer(finalizers: &[String], finalizer: &str) -> Option<Vec<String>> {
    if !finalizers.iter().any(|f| f == finalizer) {
        return None;
    }
    Some(
        finalizers
            .iter()
            .filter(|f| f.as_str() != finalizer)
            .cloned()
            .collect(),
    )
}

/// Build the connection secret for a record, if it asks for one
pub fn connection_secret<K: Managed>(cr: &K, details: &ConnectionDetails) -> Option<Secret> {
    let target = cr.resource_spec().write_connection_secret_to_ref.as_ref()?;
    let record_namespace = cr.namespace().unwrap_or_default();
    let namespace = target.namespace.clone().unwrap_or_else(|| record_namespace.clone());
    // Owner references cannot cross namespaces
    let owner_references = (namespace == record_namespace)
        .then(|| cr.controller_owner_ref(&()))
        .flatten()
        .map(|owner| vec![owner]);

    Some(Secret {
        metadata: ObjectMeta {
            name: Some(target.name.clone()),
            namespace: Some(namespace),
            owner_references,
            ..Default::default()
        },
        type_: Some(CONNECTION_SECRET_TYPE.to_string()),
        data: Some(
            details
                .iter()
                .map(|(k, v)| (k.clone(), ByteString(v.clone())))
                .collect(),
        ),
        ..Default::default()
    })
}

/// `RecordStore` backed by the Kubernetes API
pub struct KubeRecordStore<K> {
    client: Client,
    _kind: PhantomData<fn() -> K>,
}

impl<K> KubeRecordStore<K> {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            _kind: PhantomData,
        }
    }
}

impl<K: Managed> KubeRecordStore<K> {
    fn api(&self, cr: &K) -> Api<K> {
        Api::namespaced(self.client.clone(), &cr.namespace().unwrap_or_default())
    }

    async fn patch_finalizers(&self, cr: &mut K, finalizers: Vec<String>) -> Result<(), ControllerError> {
        let patch = json!({ "metadata": { "finalizers": finalizers } });
        let updated = self
            .api(cr)
            .patch(&cr.name_any(), &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        cr.meta_mut().finalizers = Some(finalizers);
        cr.meta_mut().resource_version = updated.resource_version();
        Ok(())
    }
}

#[async_trait]
impl<K: Managed> RecordStore<K> for KubeRecordStore<K> {
    async fn add_finalizer(&self, cr: &mut K) -> Result<(), ControllerError> {
        match with_finalizer(cr.finalizers(), MANAGED_FINALIZER) {
            Some(finalizers) => {
                debug!(name = %cr.name_any(), "adding finalizer");
                self.patch_finalizers(cr, finalizers).await
            }
            None => Ok(()),
        }
    }

    async fn remove_finalizer(&self, cr: &mut K) -> Result<(), ControllerError> {
        match without_finalizer(cr.finalizers(), MANAGED_FINALIZER) {
            Some(finalizers) => {
                debug!(name = %cr.name_any(), "removing finalizer");
                match self.patch_finalizers(cr, finalizers).await {
                    // Already gone
                    Err(ControllerError::Kube(kube::Error::Api(e))) if e.code == 404 => Ok(()),
                    other => other,
                }
            }
            None => Ok(()),
        }
    }

    async fn update_record(&self, cr: &mut K) -> Result<(), ControllerError> {
        let value = serde_json::to_value(&*cr)?;
        let patch = json!({
            "metadata": {
                "annotations": cr.annotations(),
                "resourceVersion": cr.resource_version(),
            },
            "spec": value.get("spec"),
        });
        let updated = self
            .api(cr)
            .patch(&cr.name_any(), &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        cr.meta_mut().resource_version = updated.resource_version();
        Ok(())
    }

    async fn update_status(&self, cr: &mut K) -> Result<(), ControllerError> {
        let generation = cr.meta().generation;
        cr.resource_status_mut().observed_generation = generation;
        let value = serde_json::to_value(&*cr)?;
        let patch = json!({ "status": value.get("status") });
        self.api(cr)
            .patch_status(&cr.name_any(), &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }

    async fn publish_connection_details(
        &self,
        cr: &K,
        details: &ConnectionDetails,
    ) -> Result<(), ControllerError> {
        if details.is_empty() {
            return Ok(());
        }
        let Some(secret) = connection_secret(cr, details) else {
            return Ok(());
        };
        let name = secret.name_any();
        let api: Api<Secret> = Api::namespaced(self.client.clone(), &secret.namespace().unwrap_or_default());
        debug!(secret = %name, keys = details.len(), "publishing connection details");
        api.patch(&name, &PatchParams::apply(FIELD_MANAGER).force(), &Patch::Apply(&secret))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::connection_detail;
    use crate::test_utils::project_record;
    use crds::SecretReference;

    #[test]
    fn finalizer_lists() {
        assert_eq!(
            with_finalizer(&[], MANAGED_FINALIZER),
            Some(vec![MANAGED_FINALIZER.to_string()])
        );
        assert_eq!(with_finalizer(&[MANAGED_FINALIZER.to_string()], MANAGED_FINALIZER), None);
        let other = "other.example.com".to_string();
        assert_eq!(
            without_finalizer(&[other.clone(), MANAGED_FINALIZER.to_string()], MANAGED_FINALIZER),
            Some(vec![other.clone()])
        );
        assert_eq!(without_finalizer(&[other], MANAGED_FINALIZER), None);
    }

    #[test]
    fn no_secret_without_target() {
        let cr = project_record("demo");
        assert!(connection_secret(&cr, &connection_detail("token", "t")).is_none());
    }

    #[test]
    fn secret_is_owned_by_record_in_same_namespace() {
        let mut cr = project_record("demo");
        cr.metadata.uid = Some("uid-1".to_string());
        cr.spec.resource.write_connection_secret_to_ref = Some(SecretReference {
            name: "demo-conn".to_string(),
            namespace: None,
        });
        let secret = connection_secret(&cr, &connection_detail("runnersToken", "abc")).unwrap();
        assert_eq!(secret.metadata.namespace.as_deref(), Some("default"));
        assert_eq!(secret.type_.as_deref(), Some(CONNECTION_SECRET_TYPE));
        let owners = secret.metadata.owner_references.unwrap();
        assert_eq!(owners[0].uid, "uid-1");
        assert_eq!(secret.data.unwrap()["runnersToken"].0, b"abc".to_vec());
    }

    #[test]
    fn cross_namespace_secret_has_no_owner() {
        let mut cr = project_record("demo");
        cr.metadata.uid = Some("uid-1".to_string());
        cr.spec.resource.write_connection_secret_to_ref = Some(SecretReference {
            name: "demo-conn".to_string(),
            namespace: Some("elsewhere".to_string()),
        });
        let secret = connection_secret(&cr, &connection_detail("token", "t")).unwrap();
        assert!(secret.metadata.owner_references.is_none());
    }
}
