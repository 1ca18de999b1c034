//! Provider config usage tracking
//!
//! Counts the `ProviderConfigUsage` records pointing at each provider config
//! into `status.users` and holds the `in-use.crossplane.io` finalizer until
//! the last user is gone.

use crate::error::ControllerError;
use crate::store::{with_finalizer, without_finalizer};
use crate::watcher::Reconcile;
use async_trait::async_trait;
use crds::{
    AccessToken, ApprovalRule, ClusterProviderConfig, DeployToken, Group, Hook, LdapGroupLink, Member,
    PipelineSchedule, Project, ProtectedBranch, ProviderConfig, ProviderConfigKind, ProviderConfigReference,
    ProviderConfigUsage, Runner, SamlGroupLink, Variable, IN_USE_FINALIZER, PROVIDER_CONFIG_KIND_LABEL,
    PROVIDER_CONFIG_LABEL,
};
use kube::api::{ListParams, Patch, PatchParams};
use kube::{Api, Client, Resource, ResourceExt};
use kube_runtime::controller::Action;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::fmt::Debug;
use std::marker::PhantomData;
use std::time::Duration;
use tracing::{debug, info, warn};

/// API version of a managed kind, by kind name
fn managed_api_version(kind: &str) -> Option<String> {
    let version = match kind {
        "Project" => Project::api_version(&()),
        "Hook" => Hook::api_version(&()),
        "Variable" => Variable::api_version(&()),
        "Member" => Member::api_version(&()),
        "DeployToken" => DeployToken::api_version(&()),
        "AccessToken" => AccessToken::api_version(&()),
        "ApprovalRule" => ApprovalRule::api_version(&()),
        "ProtectedBranch" => ProtectedBranch::api_version(&()),
        "PipelineSchedule" => PipelineSchedule::api_version(&()),
        "Group" => Group::api_version(&()),
        "SamlGroupLink" => SamlGroupLink::api_version(&()),
        "LdapGroupLink" => LdapGroupLink::api_version(&()),
        "Runner" => Runner::api_version(&()),
        _ => return None,
    };
    Some(version.into_owned())
}

/// A usage must point at a managed kind this controller serves
pub fn validate_usage(usage: &ProviderConfigUsage) -> Result<(), ControllerError> {
    let target = &usage.spec.resource_ref;
    let expected = managed_api_version(&target.kind)
        .ok_or_else(|| ControllerError::TypeMismatch("GitLab resource".to_string()))?;
    if target.api_version != expected {
        return Err(ControllerError::TypeMismatch(format!("{} ({expected})", target.kind)));
    }
    Ok(())
}

/// Valid usages of the config `reference` names
pub fn count_users(usages: &[ProviderConfigUsage], reference: &ProviderConfigReference) -> usize {
    usages
        .iter()
        .filter(|u| u.spec.provider_config_ref == *reference)
        .filter(|u| match validate_usage(u) {
            Ok(()) => true,
            Err(e) => {
                warn!(usage = %u.name_any(), error = %e, "ignoring usage");
                false
            }
        })
        .count()
}

/// What happens to the in-use finalizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizerStep {
    /// Ensure the finalizer is present
    Hold,
    /// Deletion requested but users remain
    Wait,
    /// Deletion requested and nobody uses the config
    Release,
}

pub fn finalizer_step(deleting: bool, users: usize) -> FinalizerStep {
    match (deleting, users) {
        (false, _) => FinalizerStep::Hold,
        (true, 0) => FinalizerStep::Release,
        (true, _) => FinalizerStep::Wait,
    }
}

/// Both provider config kinds
pub trait ProviderConfigRecord:
    Resource<DynamicType = ()> + Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const KIND: ProviderConfigKind;

    /// API for this config, in its own namespace if it has one
    fn api(client: Client, namespace: Option<&str>) -> Api<Self>;

    /// Usages that may point at a config in `namespace`
    fn usages_api(client: Client, namespace: Option<&str>) -> Api<ProviderConfigUsage> {
        match namespace {
            Some(ns) => Api::namespaced(client, ns),
            None => Api::all(client),
        }
    }

    fn users(&self) -> Option<i64>;
}

impl ProviderConfigRecord for ClusterProviderConfig {
    const KIND: ProviderConfigKind = ProviderConfigKind::ClusterProviderConfig;

    fn api(client: Client, _namespace: Option<&str>) -> Api<Self> {
        Api::all(client)
    }

    fn users(&self) -> Option<i64> {
        self.status.as_ref().and_then(|s| s.users)
    }
}

impl ProviderConfigRecord for ProviderConfig {
    const KIND: ProviderConfigKind = ProviderConfigKind::ProviderConfig;

    fn api(client: Client, namespace: Option<&str>) -> Api<Self> {
        Api::namespaced(client, namespace.unwrap_or_default())
    }

    fn users(&self) -> Option<i64> {
        self.status.as_ref().and_then(|s| s.users)
    }
}

/// Keeps `status.users` and the in-use finalizer of provider configs current
pub struct UsageTracker<P> {
    client: Client,
    poll_interval: Duration,
    _kind: PhantomData<fn() -> P>,
}

impl<P: ProviderConfigRecord> UsageTracker<P> {
    pub fn new(client: Client, poll_interval: Duration) -> Self {
        Self {
            client,
            poll_interval,
            _kind: PhantomData,
        }
    }

    async fn list_usages(&self, pc: &P) -> Result<Vec<ProviderConfigUsage>, ControllerError> {
        let namespace = pc.namespace();
        let selector = format!(
            "{PROVIDER_CONFIG_LABEL}={},{PROVIDER_CONFIG_KIND_LABEL}={}",
            pc.name_any(),
            P::KIND.as_str()
        );
        let usages = P::usages_api(self.client.clone(), namespace.as_deref())
            .list(&ListParams::default().labels(&selector))
            .await?;
        Ok(usages.items)
    }

    async fn patch_finalizers(&self, pc: &P, finalizers: Vec<String>) -> Result<(), ControllerError> {
        let patch = json!({ "metadata": { "finalizers": finalizers } });
        P::api(self.client.clone(), pc.namespace().as_deref())
            .patch(&pc.name_any(), &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl<P: ProviderConfigRecord> Reconcile<P> for UsageTracker<P> {
    async fn reconcile(&self, pc: &P) -> Result<Action, ControllerError> {
        let name = pc.name_any();
        let reference = ProviderConfigReference {
            name: name.clone(),
            kind: P::KIND,
        };
        let usages = self.list_usages(pc).await?;
        let users = count_users(&usages, &reference);
        let users_i64 = i64::try_from(users).unwrap_or(i64::MAX);

        if pc.users() != Some(users_i64) {
            debug!(kind = P::KIND.as_str(), %name, users, "updating provider config users");
            let patch = json!({ "status": { "users": users_i64 } });
            P::api(self.client.clone(), pc.namespace().as_deref())
                .patch_status(&name, &PatchParams::default(), &Patch::Merge(&patch))
                .await?;
        }

        let deleting = pc.meta().deletion_timestamp.is_some();
        match finalizer_step(deleting, users) {
            FinalizerStep::Hold => {
                if let Some(finalizers) = with_finalizer(pc.finalizers(), IN_USE_FINALIZER) {
                    self.patch_finalizers(pc, finalizers).await?;
                }
                // Usages change without touching the config
                Ok(Action::requeue(self.poll_interval))
            }
            FinalizerStep::Wait => {
                info!(kind = P::KIND.as_str(), %name, users, "provider config is still in use");
                Ok(Action::requeue(Duration::from_secs(10)))
            }
            FinalizerStep::Release => {
                if let Some(finalizers) = without_finalizer(pc.finalizers(), IN_USE_FINALIZER) {
                    info!(kind = P::KIND.as_str(), %name, "provider config no longer in use, releasing");
                    self.patch_finalizers(pc, finalizers).await?;
                }
                Ok(Action::await_change())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crds::{ProviderConfigUsageSpec, TypedReference};

    fn usage(name: &str, reference: ProviderConfigReference, kind: &str, api_version: &str) -> ProviderConfigUsage {
        ProviderConfigUsage::new(
            name,
            ProviderConfigUsageSpec {
                provider_config_ref: reference,
                resource_ref: TypedReference {
                    api_version: api_version.to_string(),
                    kind: kind.to_string(),
                    name: name.to_string(),
                    uid: None,
                },
            },
        )
    }

    fn project_usage(name: &str, reference: ProviderConfigReference) -> ProviderConfigUsage {
        usage(name, reference, "Project", &Project::api_version(&()))
    }

    #[test]
    fn counts_only_usages_of_this_config() {
        let usages = vec![
            project_usage("a", ProviderConfigReference::cluster("default")),
            project_usage("b", ProviderConfigReference::cluster("default")),
            project_usage("c", ProviderConfigReference::cluster("other")),
            project_usage("d", ProviderConfigReference::namespaced("default")),
        ];
        assert_eq!(count_users(&usages, &ProviderConfigReference::cluster("default")), 2);
        assert_eq!(count_users(&usages, &ProviderConfigReference::namespaced("default")), 1);
        assert_eq!(count_users(&[], &ProviderConfigReference::cluster("default")), 0);
    }

    #[test]
    fn foreign_usages_are_rejected() {
        let unknown = usage("a", ProviderConfigReference::cluster("default"), "Widget", "example.com/v1");
        assert_eq!(
            validate_usage(&unknown).unwrap_err().to_string(),
            "managed resource is not a GitLab resource"
        );

        let wrong_group = usage("b", ProviderConfigReference::cluster("default"), "Runner", "example.com/v1");
        let err = validate_usage(&wrong_group).unwrap_err();
        assert!(matches!(err, ControllerError::TypeMismatch(_)));
        assert!(err.to_string().starts_with("managed resource is not a Runner"));

        assert_eq!(count_users(&[unknown, wrong_group], &ProviderConfigReference::cluster("default")), 0);
    }

    #[test]
    fn every_kind_is_known() {
        for kind in [
            "Project", "Hook", "Variable", "Member", "DeployToken", "AccessToken", "ApprovalRule",
            "ProtectedBranch", "PipelineSchedule", "Group", "SamlGroupLink", "LdapGroupLink", "Runner",
        ] {
            assert!(managed_api_version(kind).is_some(), "{kind}");
        }
    }

    #[test]
    fn finalizer_is_held_while_in_use() {
        assert_eq!(finalizer_step(false, 0), FinalizerStep::Hold);
        assert_eq!(finalizer_step(false, 3), FinalizerStep::Hold);
        assert_eq!(finalizer_step(true, 2), FinalizerStep::Wait);
        assert_eq!(finalizer_step(true, 0), FinalizerStep::Release);
    }
}
