//! Project CRD
//!
//! A GitLab project. The external-name is the numeric project ID.

use crate::managed::{ResourceSpec, ResourceStatus};
use crate::references::ResourceReference;
use crate::values::{AccessControlValue, MergeMethodValue, SquashOptionValue, VisibilityValue};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "projects.gitlab.crossplane.io",
    version = "v1alpha1",
    kind = "Project",
    namespaced,
    status = "ProjectStatus",
    category = "crossplane",
    category = "managed",
    category = "gitlab",
    printcolumn = r#"{"name":"READY","type":"string","jsonPath":".status.conditions[?(@.type=='Ready')].status"}"#,
    printcolumn = r#"{"name":"SYNCED","type":"string","jsonPath":".status.conditions[?(@.type=='Synced')].status"}"#,
    printcolumn = r#"{"name":"EXTERNAL-NAME","type":"string","jsonPath":".metadata.annotations.crossplane\\.io/external-name"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSpec {
    #[serde(flatten)]
    pub resource: ResourceSpec,

    /// Desired project state
    pub for_provider: ProjectParameters,
}

/// Desired state of a project
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectParameters {
    /// Project name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Repository path (defaults to a slug of the name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Namespace (group) to create the project in; ignored after create
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_id: Option<i64>,

    /// Group resource supplying `namespaceId`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_id_ref: Option<ResourceReference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<VisibilityValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issues_access_level: Option<AccessControlValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_access_level: Option<AccessControlValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_requests_access_level: Option<AccessControlValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builds_access_level: Option<AccessControlValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wiki_access_level: Option<AccessControlValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippets_access_level: Option<AccessControlValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages_access_level: Option<AccessControlValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_registry_access_level: Option<AccessControlValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolve_outdated_diff_discussions: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_runners_enabled: Option<bool>,

    /// Deprecated in favour of `publicJobs`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_builds: Option<bool>,

    /// Whether job logs are visible to non-members
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_jobs: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub only_allow_merge_if_pipeline_succeeds: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub only_allow_merge_if_all_discussions_are_resolved: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_method: Option<MergeMethodValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub squash_option: Option<SquashOptionValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove_source_branch_after_merge: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lfs_enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_access_enabled: Option<bool>,

    /// Topics; order is not significant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topics: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ci_config_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ci_default_git_depth: Option<i64>,

    /// Job timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_timeout: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_devops_enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packages_enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirror: Option<bool>,

    /// User that triggers pull-mirror pipelines; zero from the API means unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirror_user_id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirror_trigger_builds: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub only_mirror_protected_branches: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirror_overwrites_diverged_branches: Option<bool>,

    /// Create the repository with a README; only used at create
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initialize_with_readme: Option<bool>,

    /// Follow the soft delete with a permanent delete
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permanently_remove: Option<bool>,

    /// Drop the record once the remote project is marked for deletion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove_finalizer_on_pending_deletion: Option<bool>,
}

/// Namespace a project lives in
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectNamespaceObservation {
    pub id: i64,
    pub name: String,
    pub path: String,
    pub kind: String,
    pub full_path: String,
}

/// Observed project state
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectObservation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_with_namespace: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_url_to_repo: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_url_to_repo: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<ProjectNamespaceObservation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty_repo: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub star_count: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forks_count: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_issues_count: Option<i64>,

    /// RFC 3339
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    /// RFC 3339
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity_at: Option<String>,

    /// Date the project was scheduled for deletion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marked_for_deletion_on: Option<String>,

    /// `publicBuilds` is in effect because `publicJobs` is unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub using_deprecated_public_builds: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStatus {
    #[serde(flatten)]
    pub resource: ResourceStatus,

    #[serde(default)]
    pub at_provider: ProjectObservation,
}

crate::impl_managed!(Project, ProjectStatus);
