//! Managed resource building blocks
//!
//! Every GitLab kind has the same outer shape:
//!
//! - `spec`: the common [`ResourceSpec`] (provider config, connection secret,
//!   management policies, deletion policy) flattened next to `forProvider`
//! - `status`: the common [`ResourceStatus`] (conditions, observed generation)
//!   flattened next to `atProvider`
//! - the `crossplane.io/external-name` annotation binding the record to the
//!   remote object
//!
//! [`Managed`] gives the reconciler uniform access to those parts.

use crate::references::{ProviderConfigReference, SecretReference};
use chrono::{DateTime, Utc};
use k8s_openapi::NamespaceResourceScope;
use kube::Resource;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Annotation holding the identifier of the remote object
pub const EXTERNAL_NAME_ANNOTATION: &str = "crossplane.io/external-name";

/// Annotation that stops reconciliation while set to `"true"`
pub const PAUSED_ANNOTATION: &str = "crossplane.io/paused";

/// Finalizer held while the remote object may still exist
pub const MANAGED_FINALIZER: &str = "finalizer.managedresource.crossplane.io";

/// Operation the controller may perform on the remote object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum ManagementAction {
    /// Read remote state
    Observe,
    /// Create missing remote objects
    Create,
    /// Push spec changes to the remote object
    Update,
    /// Delete the remote object when the record is deleted
    Delete,
    /// Fill unset spec fields from remote defaults
    LateInitialize,
    /// Every action
    #[serde(rename = "*")]
    All,
}

/// What happens to the remote object when the record is deleted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum DeletionPolicy {
    /// Delete the remote object
    #[default]
    Delete,
    /// Leave the remote object in place
    Orphan,
}

fn default_management_policies() -> Vec<ManagementAction> {
    vec![ManagementAction::All]
}

/// Fields common to every managed resource spec
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSpec {
    /// Provider config holding the GitLab endpoint and credentials
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_config_ref: Option<ProviderConfigReference>,

    /// Secret receiving connection details (tokens)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_connection_secret_to_ref: Option<SecretReference>,

    /// Actions the controller may take
    #[serde(default = "default_management_policies")]
    pub management_policies: Vec<ManagementAction>,

    /// Whether deleting the record deletes the remote object
    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
}

impl Default for ResourceSpec {
    fn default() -> Self {
        Self {
            provider_config_ref: None,
            write_connection_secret_to_ref: None,
            management_policies: default_management_policies(),
            deletion_policy: DeletionPolicy::Delete,
        }
    }
}

impl ResourceSpec {
    /// Whether `action` is permitted by the management policies
    ///
    /// An empty policy list behaves like `["*"]`.
    pub fn allows(&self, action: ManagementAction) -> bool {
        self.management_policies.is_empty()
            || self
                .management_policies
                .iter()
                .any(|a| *a == ManagementAction::All || *a == action)
    }
}

/// Condition type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum ConditionType {
    /// Remote object availability
    Ready,
    /// Outcome of the last reconcile
    Synced,
}

/// Condition status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ConditionStatus {
    /// Condition holds
    True,
    /// Condition does not hold
    False,
    /// Not known yet
    Unknown,
}

/// Condition reason
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ConditionReason {
    /// Remote object exists and was observed
    Available,
    /// Remote object is not available
    Unavailable,
    /// Remote object is being created
    Creating,
    /// Remote object is being deleted
    Deleting,
    /// Last reconcile succeeded
    ReconcileSuccess,
    /// Last reconcile failed
    ReconcileError,
    /// Reconciliation is paused by management policies
    ReconcilePaused,
}

/// Status condition
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Condition type
    #[serde(rename = "type")]
    pub condition_type: ConditionType,

    /// Condition status
    pub status: ConditionStatus,

    /// Machine readable reason
    pub reason: ConditionReason,

    /// Human readable detail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// When status or reason last changed
    pub last_transition_time: DateTime<Utc>,
}

macro_rules! condition_constructors {
    ($($(#[$doc:meta])* $fn_name:ident => ($ty:ident, $status:ident, $reason:ident)),+ $(,)?) => {
        impl Condition {
            $(
                $(#[$doc])*
                pub fn $fn_name() -> Self {
                    Self::new(ConditionType::$ty, ConditionStatus::$status, ConditionReason::$reason, None)
                }
            )+
        }
    };
}

condition_constructors! {
    /// Ready: the remote object exists
    available => (Ready, True, Available),
    /// Ready: the remote object is not available
    unavailable => (Ready, False, Unavailable),
    /// Ready: the remote object is being created
    creating => (Ready, False, Creating),
    /// Ready: the remote object is being deleted
    deleting => (Ready, False, Deleting),
    /// Synced: the last reconcile succeeded
    reconcile_success => (Synced, True, ReconcileSuccess),
    /// Synced: management policies forbid every mutating action
    reconcile_paused => (Synced, False, ReconcilePaused),
}

impl Condition {
    /// Create a condition stamped with the current time
    pub fn new(
        condition_type: ConditionType,
        status: ConditionStatus,
        reason: ConditionReason,
        message: Option<String>,
    ) -> Self {
        Self {
            condition_type,
            status,
            reason,
            message,
            last_transition_time: Utc::now(),
        }
    }

    /// Synced: the last reconcile failed with `err`
    pub fn reconcile_error(err: impl fmt::Display) -> Self {
        Self::new(
            ConditionType::Synced,
            ConditionStatus::False,
            ConditionReason::ReconcileError,
            Some(err.to_string()),
        )
    }

    /// Equal apart from the transition time
    pub fn equal_ignoring_time(&self, other: &Condition) -> bool {
        self.condition_type == other.condition_type
            && self.status == other.status
            && self.reason == other.reason
            && self.message == other.message
    }
}

/// Fields common to every managed resource status
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceStatus {
    /// Ready and Synced conditions, one per type
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    /// Generation observed by the last status write
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

impl ResourceStatus {
    /// Set conditions, replacing any existing condition of the same type
    ///
    /// The previous transition time is kept when status and reason did not change.
    pub fn set_conditions(&mut self, conditions: impl IntoIterator<Item = Condition>) {
        for mut condition in conditions {
            match self
                .conditions
                .iter_mut()
                .find(|c| c.condition_type == condition.condition_type)
            {
                Some(existing) => {
                    if existing.status == condition.status && existing.reason == condition.reason {
                        condition.last_transition_time = existing.last_transition_time;
                    }
                    *existing = condition;
                }
                None => self.conditions.push(condition),
            }
        }
    }

    /// Condition of the given type
    pub fn condition(&self, condition_type: ConditionType) -> Option<&Condition> {
        self.conditions
            .iter()
            .find(|c| c.condition_type == condition_type)
    }
}

/// Uniform access to a managed resource
///
/// Implemented for every kind with [`impl_managed!`](crate::impl_managed).
pub trait Managed:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + fmt::Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    /// Common spec fields
    fn resource_spec(&self) -> &ResourceSpec;

    /// Common status fields, if a status exists
    fn resource_status(&self) -> Option<&ResourceStatus>;

    /// Common status fields, creating an empty status if needed
    fn resource_status_mut(&mut self) -> &mut ResourceStatus;

    /// External-name annotation, empty when unset
    fn external_name(&self) -> &str {
        self.meta()
            .annotations
            .as_ref()
            .and_then(|a| a.get(EXTERNAL_NAME_ANNOTATION))
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Set the external-name annotation
    fn set_external_name(&mut self, name: impl Into<String>) {
        self.meta_mut()
            .annotations
            .get_or_insert_with(BTreeMap::new)
            .insert(EXTERNAL_NAME_ANNOTATION.to_string(), name.into());
    }

    /// Set conditions, last one wins per type
    fn set_conditions(&mut self, conditions: impl IntoIterator<Item = Condition>) {
        self.resource_status_mut().set_conditions(conditions);
    }

    /// Condition of the given type
    fn condition(&self, condition_type: ConditionType) -> Option<&Condition> {
        self.resource_status()
            .and_then(|s| s.condition(condition_type))
    }

    /// Whether the record has a deletion timestamp
    fn is_deleting(&self) -> bool {
        self.meta().deletion_timestamp.is_some()
    }

    /// Whether reconciliation is paused by annotation
    fn is_paused(&self) -> bool {
        self.meta()
            .annotations
            .as_ref()
            .and_then(|a| a.get(PAUSED_ANNOTATION))
            .is_some_and(|v| v == "true")
    }
}

/// Implement [`Managed`] for a kind whose spec flattens `resource: ResourceSpec`
/// and whose status flattens `resource: ResourceStatus`.
#[macro_export]
macro_rules! impl_managed {
    ($kind:ty, $status:ty) => {
        impl $crate::Managed for $kind {
            fn resource_spec(&self) -> &$crate::ResourceSpec {
                &self.spec.resource
            }

            fn resource_status(&self) -> Option<&$crate::ResourceStatus> {
                self.status.as_ref().map(|s| &s.resource)
            }

            fn resource_status_mut(&mut self) -> &mut $crate::ResourceStatus {
                &mut self.status.get_or_insert_with(<$status>::default).resource
            }
        }
    };
}
