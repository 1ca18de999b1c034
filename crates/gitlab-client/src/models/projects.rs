//! Project-scoped models: projects, hooks, variables, members, tokens,
//! approval rules, protected branches and pipeline schedules.

use super::{BasicGroup, BasicUser};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

/// Namespace a project lives in
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectNamespace {
    pub id: i64,
    pub name: String,
    pub path: String,
    pub kind: String,
    pub full_path: String,
}

/// GitLab project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub path: String,
    pub path_with_namespace: String,
    pub description: Option<String>,
    pub default_branch: Option<String>,
    pub visibility: String,
    pub namespace: Option<ProjectNamespace>,
    pub http_url_to_repo: String,
    pub ssh_url_to_repo: String,
    pub web_url: String,
    pub created_at: Option<DateTime<Utc>>,
    pub last_activity_at: Option<DateTime<Utc>>,
    pub marked_for_deletion_on: Option<String>,
    pub archived: bool,
    pub empty_repo: bool,
    pub topics: Vec<String>,
    pub issues_access_level: String,
    pub repository_access_level: String,
    pub merge_requests_access_level: String,
    pub builds_access_level: String,
    pub wiki_access_level: String,
    pub snippets_access_level: String,
    pub pages_access_level: String,
    pub container_registry_access_level: String,
    pub resolve_outdated_diff_discussions: bool,
    pub shared_runners_enabled: bool,
    pub public_jobs: bool,
    pub only_allow_merge_if_pipeline_succeeds: bool,
    pub only_allow_merge_if_all_discussions_are_resolved: bool,
    pub merge_method: String,
    pub squash_option: String,
    pub remove_source_branch_after_merge: bool,
    pub lfs_enabled: bool,
    pub request_access_enabled: bool,
    pub ci_config_path: Option<String>,
    pub ci_default_git_depth: Option<i64>,
    pub build_timeout: i64,
    pub auto_devops_enabled: bool,
    pub packages_enabled: Option<bool>,
    pub mirror: bool,
    pub mirror_user_id: Option<i64>,
    pub mirror_trigger_builds: bool,
    pub only_mirror_protected_branches: bool,
    pub mirror_overwrites_diverged_branches: bool,
    pub runners_token: Option<String>,
    pub forks_count: i64,
    pub star_count: i64,
    pub open_issues_count: i64,
}

/// Settings shared by project creation and edit requests
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issues_access_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository_access_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_requests_access_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub builds_access_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wiki_access_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippets_access_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages_access_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_registry_access_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolve_outdated_diff_discussions: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_runners_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_jobs: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub only_allow_merge_if_pipeline_succeeds: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub only_allow_merge_if_all_discussions_are_resolved: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub squash_option: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_source_branch_after_merge: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lfs_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_access_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topics: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ci_config_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ci_default_git_depth: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_timeout: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_devops_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packages_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirror: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirror_trigger_builds: Option<bool>,
}

/// `POST /projects`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateProjectOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initialize_with_readme: Option<bool>,
    #[serde(flatten)]
    pub settings: ProjectSettings,
}

/// `PUT /projects/:id`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditProjectOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(flatten)]
    pub settings: ProjectSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirror_user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub only_mirror_protected_branches: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirror_overwrites_diverged_branches: Option<bool>,
}

/// `DELETE /projects/:id` query parameters
///
/// A first delete marks the project for deletion. Passing `permanently_remove`
/// together with the project's `full_path` removes a project that is already
/// marked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteProjectOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permanently_remove: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_path: Option<String>,
}

// ---------------------------------------------------------------------------
// Hooks
// ---------------------------------------------------------------------------

/// Project webhook
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectHook {
    pub id: i64,
    pub url: String,
    pub project_id: i64,
    pub push_events: bool,
    pub push_events_branch_filter: Option<String>,
    pub issues_events: bool,
    pub confidential_issues_events: bool,
    pub merge_requests_events: bool,
    pub tag_push_events: bool,
    pub note_events: bool,
    pub confidential_note_events: Option<bool>,
    pub job_events: bool,
    pub pipeline_events: bool,
    pub wiki_page_events: bool,
    pub deployment_events: bool,
    pub releases_events: bool,
    pub enable_ssl_verification: bool,
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of `POST`/`PUT /projects/:id/hooks`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectHookOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_events: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_events_branch_filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issues_events: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidential_issues_events: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_requests_events: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_push_events: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note_events: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidential_note_events: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_events: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline_events: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wiki_page_events: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_events: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub releases_events: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_ssl_verification: Option<bool>,
}

// ---------------------------------------------------------------------------
// CI/CD variables
// ---------------------------------------------------------------------------

/// Project-level CI/CD variable
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectVariable {
    pub key: String,
    pub value: String,
    pub variable_type: String,
    pub protected: bool,
    pub masked: bool,
    pub raw: bool,
    pub environment_scope: String,
    pub description: Option<String>,
}

/// `POST /projects/:id/variables`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateProjectVariableOptions {
    pub key: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protected: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub masked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment_scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// `PUT /projects/:id/variables/:key`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateProjectVariableOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protected: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub masked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment_scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Members
// ---------------------------------------------------------------------------

/// Direct member of a project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectMember {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub state: String,
    pub avatar_url: Option<String>,
    pub web_url: String,
    pub access_level: i64,
    pub expires_at: Option<String>,
    pub member_role_id: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
}

/// `POST /projects/:id/members`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddProjectMemberOptions {
    pub user_id: i64,
    pub access_level: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_role_id: Option<i64>,
}

/// `PUT /projects/:id/members/:user_id`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditProjectMemberOptions {
    pub access_level: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_role_id: Option<i64>,
}

// ---------------------------------------------------------------------------
// Deploy tokens and access tokens
// ---------------------------------------------------------------------------

/// Project deploy token. `token` is only present in the create response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployToken {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub scopes: Vec<String>,
    pub revoked: bool,
    pub expired: bool,
    pub token: Option<String>,
}

/// `POST /projects/:id/deploy_tokens`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateDeployTokenOptions {
    pub name: String,
    pub scopes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Project access token. `token` is only present in the create response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectAccessToken {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub scopes: Vec<String>,
    pub access_level: i64,
    pub active: bool,
    pub revoked: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub expires_at: Option<String>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub token: Option<String>,
}

/// `POST /projects/:id/access_tokens`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateProjectAccessTokenOptions {
    pub name: String,
    pub scopes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_level: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

// ---------------------------------------------------------------------------
// Approval rules
// ---------------------------------------------------------------------------

/// Protected branch as embedded in an approval rule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtectedBranchRef {
    pub id: i64,
    pub name: String,
}

/// Project-level merge request approval rule
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApprovalRule {
    pub id: i64,
    pub name: String,
    pub rule_type: String,
    pub approvals_required: i64,
    pub users: Vec<BasicUser>,
    pub groups: Vec<BasicGroup>,
    pub eligible_approvers: Vec<BasicUser>,
    pub protected_branches: Vec<ProtectedBranchRef>,
    pub applies_to_all_protected_branches: bool,
    pub contains_hidden_groups: bool,
}

/// Body of `POST`/`PUT /projects/:id/approval_rules`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRuleOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approvals_required: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_ids: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_ids: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protected_branch_ids: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usernames: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applies_to_all_protected_branches: Option<bool>,
}

// ---------------------------------------------------------------------------
// Protected branches
// ---------------------------------------------------------------------------

/// One entry of a protected branch's push/merge/unprotect access list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchAccessDescription {
    pub id: i64,
    pub access_level: i64,
    pub access_level_description: String,
    pub user_id: Option<i64>,
    pub group_id: Option<i64>,
}

/// Protected branch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtectedBranch {
    pub id: i64,
    pub name: String,
    pub push_access_levels: Vec<BranchAccessDescription>,
    pub merge_access_levels: Vec<BranchAccessDescription>,
    pub unprotect_access_levels: Vec<BranchAccessDescription>,
    pub allow_force_push: bool,
    pub code_owner_approval_required: bool,
}

/// User, group or role allowed to act on a protected branch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BranchPermissionOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_level: Option<i64>,
}

/// `POST /projects/:id/protected_branches`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProtectBranchOptions {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_access_level: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_access_level: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unprotect_access_level: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_force_push: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_owner_approval_required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_to_push: Option<Vec<BranchPermissionOptions>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_to_merge: Option<Vec<BranchPermissionOptions>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_to_unprotect: Option<Vec<BranchPermissionOptions>>,
}

// ---------------------------------------------------------------------------
// Pipeline schedules
// ---------------------------------------------------------------------------

/// Variable attached to a pipeline schedule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineVariable {
    pub key: String,
    pub value: String,
    pub variable_type: String,
}

/// Last pipeline triggered by a schedule
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LastPipeline {
    pub id: i64,
    pub sha: String,
    #[serde(rename = "ref")]
    pub ref_name: String,
    pub status: String,
}

/// Pipeline schedule
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSchedule {
    pub id: i64,
    pub description: String,
    #[serde(rename = "ref")]
    pub ref_name: String,
    pub cron: String,
    pub cron_timezone: String,
    pub next_run_at: Option<DateTime<Utc>>,
    pub active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub owner: Option<BasicUser>,
    pub last_pipeline: Option<LastPipeline>,
    pub variables: Vec<PipelineVariable>,
}

/// `POST /projects/:id/pipeline_schedules`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreatePipelineScheduleOptions {
    pub description: String,
    #[serde(rename = "ref")]
    pub ref_name: String,
    pub cron: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cron_timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

/// `PUT /projects/:id/pipeline_schedules/:schedule_id`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditPipelineScheduleOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub ref_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cron: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cron_timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

/// Body of the pipeline schedule variable create/edit endpoints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineVariableOptions {
    pub key: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable_type: Option<String>,
}
