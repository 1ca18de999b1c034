//! ApprovalRule CRD
//!
//! A project-level merge request approval rule.

use crate::managed::{ResourceSpec, ResourceStatus};
use crate::references::ResourceReference;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "projects.gitlab.crossplane.io",
    version = "v1alpha1",
    kind = "ApprovalRule",
    namespaced,
    status = "ApprovalRuleStatus",
    category = "crossplane",
    category = "managed",
    category = "gitlab",
    printcolumn = r#"{"name":"READY","type":"string","jsonPath":".status.conditions[?(@.type=='Ready')].status"}"#,
    printcolumn = r#"{"name":"SYNCED","type":"string","jsonPath":".status.conditions[?(@.type=='Synced')].status"}"#,
    printcolumn = r#"{"name":"EXTERNAL-NAME","type":"string","jsonPath":".metadata.annotations.crossplane\\.io/external-name"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRuleSpec {
    #[serde(flatten)]
    pub resource: ResourceSpec,

    pub for_provider: ApprovalRuleParameters,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRuleParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id_ref: Option<ResourceReference>,

    pub name: String,

    pub approvals_required: i64,

    /// `regular`, `any_approver`, ...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_ids: Option<Vec<i64>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_ids: Option<Vec<i64>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protected_branch_ids: Option<Vec<i64>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usernames: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applies_to_all_protected_branches: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRuleObservation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_type: Option<String>,

    /// Users able to approve, including those eligible through groups
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub eligible_approver_ids: Vec<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contains_hidden_groups: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRuleStatus {
    #[serde(flatten)]
    pub resource: ResourceStatus,

    #[serde(default)]
    pub at_provider: ApprovalRuleObservation,
}

crate::impl_managed!(ApprovalRule, ApprovalRuleStatus);
