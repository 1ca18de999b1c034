//! Service traits for mocking
//!
//! GitLab's REST API is split into services; each external client only sees
//! the service it needs. The concrete `GitLabClient` implements every trait,
//! and tests use `MockGitLabClient` instead.
//!
//! All async methods must be `Send` to work with Tokio's work-stealing runtime.
//! Project arguments (`pid`) accept either a numeric ID or a URL-unencoded
//! `namespace/path`; group arguments (`gid`) are numeric IDs.

use crate::error::GitLabError;
use crate::models::*;

/// `/projects`
#[async_trait::async_trait]
pub trait ProjectsApi: Send + Sync {
    async fn get_project(&self, pid: &str) -> Result<Project, GitLabError>;
    async fn create_project(&self, opts: &CreateProjectOptions) -> Result<Project, GitLabError>;
    async fn edit_project(&self, pid: i64, opts: &EditProjectOptions) -> Result<Project, GitLabError>;
    async fn delete_project(&self, pid: i64, opts: &DeleteProjectOptions) -> Result<(), GitLabError>;
}

/// `/projects/:id/hooks`
#[async_trait::async_trait]
pub trait ProjectHooksApi: Send + Sync {
    async fn get_project_hook(&self, pid: i64, hook_id: i64) -> Result<ProjectHook, GitLabError>;
    async fn add_project_hook(&self, pid: i64, opts: &ProjectHookOptions) -> Result<ProjectHook, GitLabError>;
    async fn edit_project_hook(&self, pid: i64, hook_id: i64, opts: &ProjectHookOptions) -> Result<ProjectHook, GitLabError>;
    async fn delete_project_hook(&self, pid: i64, hook_id: i64) -> Result<(), GitLabError>;
}

/// `/projects/:id/variables`
#[async_trait::async_trait]
pub trait ProjectVariablesApi: Send + Sync {
    /// `environment_scope` is passed as `filter[environment_scope]` when set.
    async fn get_variable(&self, pid: i64, key: &str, environment_scope: Option<&str>) -> Result<ProjectVariable, GitLabError>;
    async fn create_variable(&self, pid: i64, opts: &CreateProjectVariableOptions) -> Result<ProjectVariable, GitLabError>;
    async fn update_variable(&self, pid: i64, key: &str, opts: &UpdateProjectVariableOptions) -> Result<ProjectVariable, GitLabError>;
    async fn remove_variable(&self, pid: i64, key: &str, environment_scope: Option<&str>) -> Result<(), GitLabError>;
}

/// `/projects/:id/members`
#[async_trait::async_trait]
pub trait ProjectMembersApi: Send + Sync {
    async fn get_project_member(&self, pid: i64, user_id: i64) -> Result<ProjectMember, GitLabError>;
    async fn add_project_member(&self, pid: i64, opts: &AddProjectMemberOptions) -> Result<ProjectMember, GitLabError>;
    async fn edit_project_member(&self, pid: i64, user_id: i64, opts: &EditProjectMemberOptions) -> Result<ProjectMember, GitLabError>;
    async fn delete_project_member(&self, pid: i64, user_id: i64) -> Result<(), GitLabError>;
}

/// `/projects/:id/deploy_tokens`
#[async_trait::async_trait]
pub trait DeployTokensApi: Send + Sync {
    async fn get_project_deploy_token(&self, pid: i64, token_id: i64) -> Result<DeployToken, GitLabError>;
    async fn create_project_deploy_token(&self, pid: i64, opts: &CreateDeployTokenOptions) -> Result<DeployToken, GitLabError>;
    async fn delete_project_deploy_token(&self, pid: i64, token_id: i64) -> Result<(), GitLabError>;
}

/// `/projects/:id/access_tokens`
#[async_trait::async_trait]
pub trait ProjectAccessTokensApi: Send + Sync {
    async fn get_project_access_token(&self, pid: i64, token_id: i64) -> Result<ProjectAccessToken, GitLabError>;
    async fn create_project_access_token(&self, pid: i64, opts: &CreateProjectAccessTokenOptions) -> Result<ProjectAccessToken, GitLabError>;
    async fn revoke_project_access_token(&self, pid: i64, token_id: i64) -> Result<(), GitLabError>;
}

/// `/projects/:id/approval_rules`
#[async_trait::async_trait]
pub trait ApprovalRulesApi: Send + Sync {
    async fn get_project_approval_rule(&self, pid: i64, rule_id: i64) -> Result<ApprovalRule, GitLabError>;
    async fn create_project_approval_rule(&self, pid: i64, opts: &ApprovalRuleOptions) -> Result<ApprovalRule, GitLabError>;
    async fn update_project_approval_rule(&self, pid: i64, rule_id: i64, opts: &ApprovalRuleOptions) -> Result<ApprovalRule, GitLabError>;
    async fn delete_project_approval_rule(&self, pid: i64, rule_id: i64) -> Result<(), GitLabError>;
}

/// `/projects/:id/protected_branches`
#[async_trait::async_trait]
pub trait ProtectedBranchesApi: Send + Sync {
    async fn get_protected_branch(&self, pid: i64, branch: &str) -> Result<ProtectedBranch, GitLabError>;
    async fn protect_repository_branches(&self, pid: i64, opts: &ProtectBranchOptions) -> Result<ProtectedBranch, GitLabError>;
    async fn unprotect_repository_branches(&self, pid: i64, branch: &str) -> Result<(), GitLabError>;
}

/// `/projects/:id/pipeline_schedules`
#[async_trait::async_trait]
pub trait PipelineSchedulesApi: Send + Sync {
    async fn get_pipeline_schedule(&self, pid: i64, schedule_id: i64) -> Result<PipelineSchedule, GitLabError>;
    async fn create_pipeline_schedule(&self, pid: i64, opts: &CreatePipelineScheduleOptions) -> Result<PipelineSchedule, GitLabError>;
    async fn edit_pipeline_schedule(&self, pid: i64, schedule_id: i64, opts: &EditPipelineScheduleOptions) -> Result<PipelineSchedule, GitLabError>;
    async fn delete_pipeline_schedule(&self, pid: i64, schedule_id: i64) -> Result<(), GitLabError>;
    async fn create_pipeline_schedule_variable(&self, pid: i64, schedule_id: i64, opts: &PipelineVariableOptions) -> Result<PipelineVariable, GitLabError>;
    async fn edit_pipeline_schedule_variable(&self, pid: i64, schedule_id: i64, opts: &PipelineVariableOptions) -> Result<PipelineVariable, GitLabError>;
    async fn delete_pipeline_schedule_variable(&self, pid: i64, schedule_id: i64, key: &str) -> Result<(), GitLabError>;
}

/// `/runners` and `/user/runners`
#[async_trait::async_trait]
pub trait RunnersApi: Send + Sync {
    async fn get_runner_details(&self, runner_id: i64) -> Result<RunnerDetails, GitLabError>;
    async fn create_user_runner(&self, opts: &CreateUserRunnerOptions) -> Result<UserRunner, GitLabError>;
    async fn update_runner_details(&self, runner_id: i64, opts: &UpdateRunnerDetailsOptions) -> Result<RunnerDetails, GitLabError>;
    async fn delete_registered_runner_by_id(&self, runner_id: i64) -> Result<(), GitLabError>;
}

/// `/groups`
#[async_trait::async_trait]
pub trait GroupsApi: Send + Sync {
    async fn get_group(&self, gid: i64) -> Result<Group, GitLabError>;
    async fn create_group(&self, opts: &CreateGroupOptions) -> Result<Group, GitLabError>;
    async fn update_group(&self, gid: i64, opts: &UpdateGroupOptions) -> Result<Group, GitLabError>;
    async fn delete_group(&self, gid: i64, opts: &DeleteGroupOptions) -> Result<(), GitLabError>;
}

/// `/groups/:id/saml_group_links`
#[async_trait::async_trait]
pub trait GroupSamlLinksApi: Send + Sync {
    async fn get_group_saml_link(&self, gid: i64, name: &str) -> Result<SamlGroupLink, GitLabError>;
    async fn add_group_saml_link(&self, gid: i64, opts: &AddSamlGroupLinkOptions) -> Result<SamlGroupLink, GitLabError>;
    async fn delete_group_saml_link(&self, gid: i64, name: &str) -> Result<(), GitLabError>;
}

/// `/groups/:id/ldap_group_links`
///
/// GitLab has no single-link GET; lookups list and filter by CN.
#[async_trait::async_trait]
pub trait GroupLdapLinksApi: Send + Sync {
    async fn list_group_ldap_links(&self, gid: i64) -> Result<Vec<LdapGroupLink>, GitLabError>;
    async fn add_group_ldap_link(&self, gid: i64, opts: &AddLdapGroupLinkOptions) -> Result<LdapGroupLink, GitLabError>;
    async fn delete_group_ldap_link(&self, gid: i64, provider: &str, cn: &str) -> Result<(), GitLabError>;
}

/// Every service at once
///
/// Blanket-implemented for anything that implements all service traits.
pub trait GitLabClientTrait:
    ProjectsApi
    + ProjectHooksApi
    + ProjectVariablesApi
    + ProjectMembersApi
    + DeployTokensApi
    + ProjectAccessTokensApi
    + ApprovalRulesApi
    + ProtectedBranchesApi
    + PipelineSchedulesApi
    + RunnersApi
    + GroupsApi
    + GroupSamlLinksApi
    + GroupLdapLinksApi
{
}

impl<T> GitLabClientTrait for T where
    T: ProjectsApi
        + ProjectHooksApi
        + ProjectVariablesApi
        + ProjectMembersApi
        + DeployTokensApi
        + ProjectAccessTokensApi
        + ApprovalRulesApi
        + ProtectedBranchesApi
        + PipelineSchedulesApi
        + RunnersApi
        + GroupsApi
        + GroupSamlLinksApi
        + GroupLdapLinksApi
{
}
