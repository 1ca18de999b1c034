//! Group CRD
//!
//! A GitLab group or subgroup. The external-name is the numeric group ID.

use crate::managed::{ResourceSpec, ResourceStatus};
use crate::references::ResourceReference;
use crate::values::{ProjectCreationLevelValue, SubgroupCreationLevelValue, VisibilityValue};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "groups.gitlab.crossplane.io",
    version = "v1alpha1",
    kind = "Group",
    namespaced,
    status = "GroupStatus",
    category = "crossplane",
    category = "managed",
    category = "gitlab",
    printcolumn = r#"{"name":"READY","type":"string","jsonPath":".status.conditions[?(@.type=='Ready')].status"}"#,
    printcolumn = r#"{"name":"SYNCED","type":"string","jsonPath":".status.conditions[?(@.type=='Synced')].status"}"#,
    printcolumn = r#"{"name":"EXTERNAL-NAME","type":"string","jsonPath":".metadata.annotations.crossplane\\.io/external-name"}"#,
    printcolumn = r#"{"name":"PATH","type":"string","jsonPath":".status.atProvider.fullPath"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct GroupSpec {
    #[serde(flatten)]
    pub resource: ResourceSpec,

    /// Desired group state
    pub for_provider: GroupParameters,
}

/// Desired state of a group
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroupParameters {
    pub name: String,

    pub path: String,

    /// Parent group; ignored after create
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,

    /// Group resource supplying `parentId`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id_ref: Option<ResourceReference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<VisibilityValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub membership_lock: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_with_group_lock: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_two_factor_authentication: Option<bool>,

    /// Hours before two-factor enforcement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub two_factor_grace_period: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_creation_level: Option<ProjectCreationLevelValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subgroup_creation_level: Option<SubgroupCreationLevelValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_devops_enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emails_disabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mentions_disabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lfs_enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_access_enabled: Option<bool>,

    /// Follow the soft delete with a permanent delete
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permanently_remove: Option<bool>,

    /// Drop the record once the remote group is marked for deletion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove_finalizer_on_pending_deletion: Option<bool>,
}

/// Observed group state
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroupObservation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,

    /// RFC 3339
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marked_for_deletion_on: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroupStatus {
    #[serde(flatten)]
    pub resource: ResourceStatus,

    #[serde(default)]
    pub at_provider: GroupObservation,
}

crate::impl_managed!(Group, GroupStatus);
