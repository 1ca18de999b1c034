//! GitLab API client
//!
//! Implements every service trait against the GitLab REST API v4.

use crate::common::{encode, AuthMethod, HttpClient};
use crate::error::GitLabError;
use crate::gitlab_trait::*;
use crate::models::*;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// GitLab API client
#[derive(Debug, Clone)]
pub struct GitLabClient {
    http: HttpClient,
}

impl GitLabClient {
    /// Create a new GitLab client
    ///
    /// # Arguments
    /// * `base_url` - GitLab base URL (e.g., "https://gitlab.com"); `/api/v4` is appended when missing
    /// * `token` - access token
    /// * `insecure` - skip TLS certificate verification
    /// * `auth` - how the token is presented
    pub fn new(
        base_url: String,
        token: String,
        insecure: bool,
        auth: AuthMethod,
    ) -> Result<Self, GitLabError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .danger_accept_invalid_certs(insecure)
            .build()?;
        debug!("Created GitLab client for {} (insecure: {})", base_url, insecure);
        Ok(Self {
            http: HttpClient::new(client, base_url, token, auth),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }
}

#[async_trait::async_trait]
impl ProjectsApi for GitLabClient {
    async fn get_project(&self, pid: &str) -> Result<Project, GitLabError> {
        self.http.get(&format!("/projects/{}", encode(pid))).await
    }

    async fn create_project(&self, opts: &CreateProjectOptions) -> Result<Project, GitLabError> {
        self.http.post("/projects", opts).await
    }

    async fn edit_project(&self, pid: i64, opts: &EditProjectOptions) -> Result<Project, GitLabError> {
        self.http.put(&format!("/projects/{pid}"), opts).await
    }

    async fn delete_project(&self, pid: i64, opts: &DeleteProjectOptions) -> Result<(), GitLabError> {
        let permanently = opts.permanently_remove.map(|b| b.to_string()).unwrap_or_default();
        let full_path = opts.full_path.clone().unwrap_or_default();
        let path = HttpClient::with_query(
            &format!("/projects/{pid}"),
            &[("permanently_remove", permanently.as_str()), ("full_path", full_path.as_str())],
        );
        self.http.delete(&path).await
    }
}

#[async_trait::async_trait]
impl ProjectHooksApi for GitLabClient {
    async fn get_project_hook(&self, pid: i64, hook_id: i64) -> Result<ProjectHook, GitLabError> {
        self.http.get(&format!("/projects/{pid}/hooks/{hook_id}")).await
    }

    async fn add_project_hook(&self, pid: i64, opts: &ProjectHookOptions) -> Result<ProjectHook, GitLabError> {
        self.http.post(&format!("/projects/{pid}/hooks"), opts).await
    }

    async fn edit_project_hook(&self, pid: i64, hook_id: i64, opts: &ProjectHookOptions) -> Result<ProjectHook, GitLabError> {
        self.http.put(&format!("/projects/{pid}/hooks/{hook_id}"), opts).await
    }

    async fn delete_project_hook(&self, pid: i64, hook_id: i64) -> Result<(), GitLabError> {
        self.http.delete(&format!("/projects/{pid}/hooks/{hook_id}")).await
    }
}

#[async_trait::async_trait]
impl ProjectVariablesApi for GitLabClient {
    async fn get_variable(&self, pid: i64, key: &str, environment_scope: Option<&str>) -> Result<ProjectVariable, GitLabError> {
        let path = HttpClient::with_query(
            &format!("/projects/{pid}/variables/{}", encode(key)),
            &[("filter[environment_scope]", environment_scope.unwrap_or_default())],
        );
        self.http.get(&path).await
    }

    async fn create_variable(&self, pid: i64, opts: &CreateProjectVariableOptions) -> Result<ProjectVariable, GitLabError> {
        self.http.post(&format!("/projects/{pid}/variables"), opts).await
    }

    async fn update_variable(&self, pid: i64, key: &str, opts: &UpdateProjectVariableOptions) -> Result<ProjectVariable, GitLabError> {
        let path = HttpClient::with_query(
            &format!("/projects/{pid}/variables/{}", encode(key)),
            &[("filter[environment_scope]", opts.environment_scope.as_deref().unwrap_or_default())],
        );
        self.http.put(&path, opts).await
    }

    async fn remove_variable(&self, pid: i64, key: &str, environment_scope: Option<&str>) -> Result<(), GitLabError> {
        let path = HttpClient::with_query(
            &format!("/projects/{pid}/variables/{}", encode(key)),
            &[("filter[environment_scope]", environment_scope.unwrap_or_default())],
        );
        self.http.delete(&path).await
    }
}

#[async_trait::async_trait]
impl ProjectMembersApi for GitLabClient {
    async fn get_project_member(&self, pid: i64, user_id: i64) -> Result<ProjectMember, GitLabError> {
        self.http.get(&format!("/projects/{pid}/members/{user_id}")).await
    }

    async fn add_project_member(&self, pid: i64, opts: &AddProjectMemberOptions) -> Result<ProjectMember, GitLabError> {
        self.http.post(&format!("/projects/{pid}/members"), opts).await
    }

    async fn edit_project_member(&self, pid: i64, user_id: i64, opts: &EditProjectMemberOptions) -> Result<ProjectMember, GitLabError> {
        self.http.put(&format!("/projects/{pid}/members/{user_id}"), opts).await
    }

    async fn delete_project_member(&self, pid: i64, user_id: i64) -> Result<(), GitLabError> {
        self.http.delete(&format!("/projects/{pid}/members/{user_id}")).await
    }
}

#[async_trait::async_trait]
impl DeployTokensApi for GitLabClient {
    async fn get_project_deploy_token(&self, pid: i64, token_id: i64) -> Result<DeployToken, GitLabError> {
        self.http.get(&format!("/projects/{pid}/deploy_tokens/{token_id}")).await
    }

    async fn create_project_deploy_token(&self, pid: i64, opts: &CreateDeployTokenOptions) -> Result<DeployToken, GitLabError> {
        self.http.post(&format!("/projects/{pid}/deploy_tokens"), opts).await
    }

    async fn delete_project_deploy_token(&self, pid: i64, token_id: i64) -> Result<(), GitLabError> {
        self.http.delete(&format!("/projects/{pid}/deploy_tokens/{token_id}")).await
    }
}

#[async_trait::async_trait]
impl ProjectAccessTokensApi for GitLabClient {
    async fn get_project_access_token(&self, pid: i64, token_id: i64) -> Result<ProjectAccessToken, GitLabError> {
        self.http.get(&format!("/projects/{pid}/access_tokens/{token_id}")).await
    }

    async fn create_project_access_token(&self, pid: i64, opts: &CreateProjectAccessTokenOptions) -> Result<ProjectAccessToken, GitLabError> {
        self.http.post(&format!("/projects/{pid}/access_tokens"), opts).await
    }

    async fn revoke_project_access_token(&self, pid: i64, token_id: i64) -> Result<(), GitLabError> {
        self.http.delete(&format!("/projects/{pid}/access_tokens/{token_id}")).await
    }
}

#[async_trait::async_trait]
impl ApprovalRulesApi for GitLabClient {
    async fn get_project_approval_rule(&self, pid: i64, rule_id: i64) -> Result<ApprovalRule, GitLabError> {
        self.http.get(&format!("/projects/{pid}/approval_rules/{rule_id}")).await
    }

    async fn create_project_approval_rule(&self, pid: i64, opts: &ApprovalRuleOptions) -> Result<ApprovalRule, GitLabError> {
        self.http.post(&format!("/projects/{pid}/approval_rules"), opts).await
    }

    async fn update_project_approval_rule(&self, pid: i64, rule_id: i64, opts: &ApprovalRuleOptions) -> Result<ApprovalRule, GitLabError> {
        self.http.put(&format!("/projects/{pid}/approval_rules/{rule_id}"), opts).await
    }

    async fn delete_project_approval_rule(&self, pid: i64, rule_id: i64) -> Result<(), GitLabError> {
        self.http.delete(&format!("/projects/{pid}/approval_rules/{rule_id}")).await
    }
}

#[async_trait::async_trait]
impl ProtectedBranchesApi for GitLabClient {
    async fn get_protected_branch(&self, pid: i64, branch: &str) -> Result<ProtectedBranch, GitLabError> {
        self.http.get(&format!("/projects/{pid}/protected_branches/{}", encode(branch))).await
    }

    async fn protect_repository_branches(&self, pid: i64, opts: &ProtectBranchOptions) -> Result<ProtectedBranch, GitLabError> {
        self.http.post(&format!("/projects/{pid}/protected_branches"), opts).await
    }

    async fn unprotect_repository_branches(&self, pid: i64, branch: &str) -> Result<(), GitLabError> {
        self.http.delete(&format!("/projects/{pid}/protected_branches/{}", encode(branch))).await
    }
}

#[async_trait::async_trait]
impl PipelineSchedulesApi for GitLabClient {
    async fn get_pipeline_schedule(&self, pid: i64, schedule_id: i64) -> Result<PipelineSchedule, GitLabError> {
        self.http.get(&format!("/projects/{pid}/pipeline_schedules/{schedule_id}")).await
    }

    async fn create_pipeline_schedule(&self, pid: i64, opts: &CreatePipelineScheduleOptions) -> Result<PipelineSchedule, GitLabError> {
        self.http.post(&format!("/projects/{pid}/pipeline_schedules"), opts).await
    }

    async fn edit_pipeline_schedule(&self, pid: i64, schedule_id: i64, opts: &EditPipelineScheduleOptions) -> Result<PipelineSchedule, GitLabError> {
        self.http.put(&format!("/projects/{pid}/pipeline_schedules/{schedule_id}"), opts).await
    }

    async fn delete_pipeline_schedule(&self, pid: i64, schedule_id: i64) -> Result<(), GitLabError> {
        self.http.delete(&format!("/projects/{pid}/pipeline_schedules/{schedule_id}")).await
    }

    async fn create_pipeline_schedule_variable(&self, pid: i64, schedule_id: i64, opts: &PipelineVariableOptions) -> Result<PipelineVariable, GitLabError> {
        self.http
            .post(&format!("/projects/{pid}/pipeline_schedules/{schedule_id}/variables"), opts)
            .await
    }

    async fn edit_pipeline_schedule_variable(&self, pid: i64, schedule_id: i64, opts: &PipelineVariableOptions) -> Result<PipelineVariable, GitLabError> {
        self.http
            .put(
                &format!("/projects/{pid}/pipeline_schedules/{schedule_id}/variables/{}", encode(&opts.key)),
                opts,
            )
            .await
    }

    async fn delete_pipeline_schedule_variable(&self, pid: i64, schedule_id: i64, key: &str) -> Result<(), GitLabError> {
        self.http
            .delete(&format!("/projects/{pid}/pipeline_schedules/{schedule_id}/variables/{}", encode(key)))
            .await
    }
}

#[async_trait::async_trait]
impl RunnersApi for GitLabClient {
    async fn get_runner_details(&self, runner_id: i64) -> Result<RunnerDetails, GitLabError> {
        self.http.get(&format!("/runners/{runner_id}")).await
    }

    async fn create_user_runner(&self, opts: &CreateUserRunnerOptions) -> Result<UserRunner, GitLabError> {
        self.http.post("/user/runners", opts).await
    }

    async fn update_runner_details(&self, runner_id: i64, opts: &UpdateRunnerDetailsOptions) -> Result<RunnerDetails, GitLabError> {
        self.http.put(&format!("/runners/{runner_id}"), opts).await
    }

    async fn delete_registered_runner_by_id(&self, runner_id: i64) -> Result<(), GitLabError> {
        self.http.delete(&format!("/runners/{runner_id}")).await
    }
}

#[async_trait::async_trait]
impl GroupsApi for GitLabClient {
    async fn get_group(&self, gid: i64) -> Result<Group, GitLabError> {
        self.http.get(&format!("/groups/{gid}")).await
    }

    async fn create_group(&self, opts: &CreateGroupOptions) -> Result<Group, GitLabError> {
        self.http.post("/groups", opts).await
    }

    async fn update_group(&self, gid: i64, opts: &UpdateGroupOptions) -> Result<Group, GitLabError> {
        self.http.put(&format!("/groups/{gid}"), opts).await
    }

    async fn delete_group(&self, gid: i64, opts: &DeleteGroupOptions) -> Result<(), GitLabError> {
        let permanently = opts.permanently_remove.map(|b| b.to_string()).unwrap_or_default();
        let full_path = opts.full_path.clone().unwrap_or_default();
        let path = HttpClient::with_query(
            &format!("/groups/{gid}"),
            &[("permanently_remove", permanently.as_str()), ("full_path", full_path.as_str())],
        );
        self.http.delete(&path).await
    }
}

#[async_trait::async_trait]
impl GroupSamlLinksApi for GitLabClient {
    async fn get_group_saml_link(&self, gid: i64, name: &str) -> Result<SamlGroupLink, GitLabError> {
        self.http.get(&format!("/groups/{gid}/saml_group_links/{}", encode(name))).await
    }

    async fn add_group_saml_link(&self, gid: i64, opts: &AddSamlGroupLinkOptions) -> Result<SamlGroupLink, GitLabError> {
        self.http.post(&format!("/groups/{gid}/saml_group_links"), opts).await
    }

    async fn delete_group_saml_link(&self, gid: i64, name: &str) -> Result<(), GitLabError> {
        self.http.delete(&format!("/groups/{gid}/saml_group_links/{}", encode(name))).await
    }
}

#[async_trait::async_trait]
impl GroupLdapLinksApi for GitLabClient {
    async fn list_group_ldap_links(&self, gid: i64) -> Result<Vec<LdapGroupLink>, GitLabError> {
        self.http.get(&format!("/groups/{gid}/ldap_group_links")).await
    }

    async fn add_group_ldap_link(&self, gid: i64, opts: &AddLdapGroupLinkOptions) -> Result<LdapGroupLink, GitLabError> {
        self.http.post(&format!("/groups/{gid}/ldap_group_links"), opts).await
    }

    async fn delete_group_ldap_link(&self, gid: i64, provider: &str, cn: &str) -> Result<(), GitLabError> {
        let path = HttpClient::with_query(
            &format!("/groups/{gid}/ldap_group_links"),
            &[("provider", provider), ("cn", cn)],
        );
        self.http.delete(&path).await
    }
}
