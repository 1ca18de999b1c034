//! Cross-resource references
//!
//! A `*IdRef` names another managed resource in the cluster. Before each
//! reconcile the referenced resource's external-name is copied into the
//! matching ID field; the engine persists the spec when that changed it.

use crate::error::ControllerError;
use async_trait::async_trait;
use crds::{
    AccessToken, ApprovalRule, DeployToken, Group, Hook, LdapGroupLink, Managed, Member,
    PipelineSchedule, Project, ProtectedBranch, ResourceReference, Runner, SamlGroupLink, Variable,
};
use kube::{Api, Client, ResourceExt};
use std::fmt;

/// Kinds that can be referenced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferencedKind {
    Project,
    Group,
}

impl fmt::Display for ReferencedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project => f.write_str("Project"),
            Self::Group => f.write_str("Group"),
        }
    }
}

/// Looks up the external-name of a referenced resource
#[async_trait]
pub trait ReferenceLookup: Send + Sync {
    /// External-name of `namespace/name`; `None` if missing or not yet created
    async fn external_name(
        &self,
        kind: ReferencedKind,
        namespace: &str,
        name: &str,
    ) -> Result<Option<String>, ControllerError>;
}

/// `ReferenceLookup` backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeReferenceLookup {
    client: Client,
}

impl KubeReferenceLookup {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn lookup<K: Managed>(&self, namespace: &str, name: &str) -> Result<Option<String>, ControllerError> {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        Ok(api
            .get_opt(name)
            .await?
            .map(|r| r.external_name().to_string())
            .filter(|n| !n.is_empty()))
    }
}

#[async_trait]
impl ReferenceLookup for KubeReferenceLookup {
    async fn external_name(
        &self,
        kind: ReferencedKind,
        namespace: &str,
        name: &str,
    ) -> Result<Option<String>, ControllerError> {
        match kind {
            ReferencedKind::Project => self.lookup::<Project>(namespace, name).await,
            ReferencedKind::Group => self.lookup::<Group>(namespace, name).await,
        }
    }
}

/// Copy a referenced resource's ID into `field`; returns whether it changed
pub async fn resolve_id(
    lookup: &dyn ReferenceLookup,
    kind: ReferencedKind,
    reference: Option<&ResourceReference>,
    field: &mut Option<i64>,
    namespace: &str,
) -> Result<bool, ControllerError> {
    let Some(reference) = reference else {
        return Ok(false);
    };
    let namespace = reference.namespace.as_deref().unwrap_or(namespace);
    let external_name = lookup
        .external_name(kind, namespace, &reference.name)
        .await?
        .ok_or_else(|| {
            ControllerError::Reference(format!(
                "referenced {kind} {namespace}/{} does not exist or is not ready",
                reference.name
            ))
        })?;
    let id = external_name
        .parse::<i64>()
        .map_err(|_| ControllerError::MalformedExternalName { value: external_name })?;
    if *field == Some(id) {
        return Ok(false);
    }
    *field = Some(id);
    Ok(true)
}

/// Fill ID fields from their references
#[async_trait]
pub trait ResolveReferences {
    /// Returns true when a field changed and the spec must be persisted
    async fn resolve_references(&mut self, lookup: &dyn ReferenceLookup) -> Result<bool, ControllerError>;
}

macro_rules! resolve_single {
    ($($kind:ty => $target:expr, $id:ident, $reference:ident);* $(;)?) => {
        $(
            #[async_trait]
            impl ResolveReferences for $kind {
                async fn resolve_references(
                    &mut self,
                    lookup: &dyn ReferenceLookup,
                ) -> Result<bool, ControllerError> {
                    let namespace = self.namespace().unwrap_or_default();
                    let params = &mut self.spec.for_provider;
                    resolve_id(lookup, $target, params.$reference.as_ref(), &mut params.$id, &namespace).await
                }
            }
        )*
    };
}

resolve_single! {
    Project => ReferencedKind::Group, namespace_id, namespace_id_ref;
    Hook => ReferencedKind::Project, project_id, project_id_ref;
    Variable => ReferencedKind::Project, project_id, project_id_ref;
    Member => ReferencedKind::Project, project_id, project_id_ref;
    DeployToken => ReferencedKind::Project, project_id, project_id_ref;
    AccessToken => ReferencedKind::Project, project_id, project_id_ref;
    ApprovalRule => ReferencedKind::Project, project_id, project_id_ref;
    ProtectedBranch => ReferencedKind::Project, project_id, project_id_ref;
    PipelineSchedule => ReferencedKind::Project, project_id, project_id_ref;
    Group => ReferencedKind::Group, parent_id, parent_id_ref;
    SamlGroupLink => ReferencedKind::Group, group_id, group_id_ref;
    LdapGroupLink => ReferencedKind::Group, group_id, group_id_ref;
}

#[async_trait]
impl ResolveReferences for Runner {
    async fn resolve_references(&mut self, lookup: &dyn ReferenceLookup) -> Result<bool, ControllerError> {
        let namespace = self.namespace().unwrap_or_default();
        let params = &mut self.spec.for_provider;
        let group = resolve_id(
            lookup,
            ReferencedKind::Group,
            params.group_id_ref.as_ref(),
            &mut params.group_id,
            &namespace,
        )
        .await?;
        let project = resolve_id(
            lookup,
            ReferencedKind::Project,
            params.project_id_ref.as_ref(),
            &mut params.project_id,
            &namespace,
        )
        .await?;
        Ok(group || project)
    }
}
