//! ProtectedBranch CRD
//!
//! Branch protection rules. The external-name is the branch name. GitLab
//! cannot edit a protection in place, so changes are applied by unprotecting
//! and protecting the branch again.

use crate::managed::{ResourceSpec, ResourceStatus};
use crate::references::ResourceReference;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "projects.gitlab.crossplane.io",
    version = "v1alpha1",
    kind = "ProtectedBranch",
    namespaced,
    status = "ProtectedBranchStatus",
    category = "crossplane",
    category = "managed",
    category = "gitlab",
    printcolumn = r#"{"name":"READY","type":"string","jsonPath":".status.conditions[?(@.type=='Ready')].status"}"#,
    printcolumn = r#"{"name":"SYNCED","type":"string","jsonPath":".status.conditions[?(@.type=='Synced')].status"}"#,
    printcolumn = r#"{"name":"BRANCH","type":"string","jsonPath":".metadata.annotations.crossplane\\.io/external-name"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ProtectedBranchSpec {
    #[serde(flatten)]
    pub resource: ResourceSpec,

    pub for_provider: ProtectedBranchParameters,
}

/// Grants one user, group or access level a branch permission
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct BranchPermission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_level: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProtectedBranchParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id_ref: Option<ResourceReference>,

    /// Branch name or wildcard
    pub branch_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_access_level: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_access_level: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unprotect_access_level: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_force_push: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_owner_approval_required: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_to_push: Option<Vec<BranchPermission>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_to_merge: Option<Vec<BranchPermission>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_to_unprotect: Option<Vec<BranchPermission>>,
}

/// One entry of an observed access list
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BranchAccessObservation {
    pub access_level: i64,

    pub access_level_description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProtectedBranchObservation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub push_access_levels: Vec<BranchAccessObservation>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub merge_access_levels: Vec<BranchAccessObservation>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unprotect_access_levels: Vec<BranchAccessObservation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_force_push: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_owner_approval_required: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProtectedBranchStatus {
    #[serde(flatten)]
    pub resource: ResourceStatus,

    #[serde(default)]
    pub at_provider: ProtectedBranchObservation,
}

crate::impl_managed!(ProtectedBranch, ProtectedBranchStatus);
