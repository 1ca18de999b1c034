//! Project-scoped operations for MockGitLabClient

use super::{lock, not_found, MockGitLabClient};
use crate::error::GitLabError;
use crate::gitlab_trait::*;
use crate::models::*;
use serde_json::json;

fn conflict(operation: &str, message: &str) -> GitLabError {
    GitLabError::Api {
        method: "MOCK",
        path: operation.to_string(),
        status: 409,
        message: message.to_string(),
    }
}

fn bad_request(operation: &str, message: &str) -> GitLabError {
    GitLabError::Api {
        method: "MOCK",
        path: operation.to_string(),
        status: 400,
        message: message.to_string(),
    }
}

fn apply_project_settings(project: &mut Project, s: &ProjectSettings) {
    macro_rules! set {
        ($($field:ident),* $(,)?) => {
            $(if let Some(v) = &s.$field { project.$field = v.clone(); })*
        };
    }
    set!(
        visibility,
        issues_access_level,
        repository_access_level,
        merge_requests_access_level,
        builds_access_level,
        wiki_access_level,
        snippets_access_level,
        pages_access_level,
        container_registry_access_level,
        resolve_outdated_diff_discussions,
        shared_runners_enabled,
        public_jobs,
        only_allow_merge_if_pipeline_succeeds,
        only_allow_merge_if_all_discussions_are_resolved,
        merge_method,
        squash_option,
        remove_source_branch_after_merge,
        lfs_enabled,
        request_access_enabled,
        topics,
        build_timeout,
        auto_devops_enabled,
        mirror,
        mirror_trigger_builds,
    );
    if s.default_branch.is_some() {
        project.default_branch = s.default_branch.clone();
    }
    if s.description.is_some() {
        project.description = s.description.clone();
    }
    if s.ci_config_path.is_some() {
        project.ci_config_path = s.ci_config_path.clone();
    }
    if s.ci_default_git_depth.is_some() {
        project.ci_default_git_depth = s.ci_default_git_depth;
    }
    if s.packages_enabled.is_some() {
        project.packages_enabled = s.packages_enabled;
    }
}

#[async_trait::async_trait]
impl ProjectsApi for MockGitLabClient {
    async fn get_project(&self, pid: &str) -> Result<Project, GitLabError> {
        self.begin("get_project", &json!({ "pid": pid }))?;
        let projects = lock(&self.projects);
        let found = match pid.parse::<i64>() {
            Ok(id) => projects.get(&id).cloned(),
            Err(_) => projects.values().find(|p| p.path_with_namespace == pid).cloned(),
        };
        found.ok_or_else(|| not_found(format!("Project {pid}")))
    }

    async fn create_project(&self, opts: &CreateProjectOptions) -> Result<Project, GitLabError> {
        self.begin("create_project", opts)?;
        let id = self.next_id();
        let name = opts.name.clone().or_else(|| opts.path.clone()).unwrap_or_default();
        let path = opts.path.clone().unwrap_or_else(|| name.to_lowercase());
        let namespace = match opts.namespace_id {
            Some(gid) => {
                let groups = lock(&self.groups);
                let group = groups.get(&gid).ok_or_else(|| not_found(format!("Namespace {gid}")))?;
                ProjectNamespace {
                    id: gid,
                    name: group.name.clone(),
                    path: group.path.clone(),
                    kind: "group".to_string(),
                    full_path: group.full_path.clone(),
                }
            }
            None => ProjectNamespace {
                id: 1,
                name: "root".to_string(),
                path: "root".to_string(),
                kind: "user".to_string(),
                full_path: "root".to_string(),
            },
        };
        let path_with_namespace = format!("{}/{}", namespace.full_path, path);
        let mut project = Project {
            id,
            name,
            path,
            web_url: format!("https://gitlab.mock/{path_with_namespace}"),
            http_url_to_repo: format!("https://gitlab.mock/{path_with_namespace}.git"),
            ssh_url_to_repo: format!("git@gitlab.mock:{path_with_namespace}.git"),
            path_with_namespace,
            namespace: Some(namespace),
            visibility: "private".to_string(),
            default_branch: Some("main".to_string()),
            issues_access_level: "enabled".to_string(),
            repository_access_level: "enabled".to_string(),
            merge_requests_access_level: "enabled".to_string(),
            builds_access_level: "enabled".to_string(),
            wiki_access_level: "enabled".to_string(),
            snippets_access_level: "enabled".to_string(),
            pages_access_level: "private".to_string(),
            container_registry_access_level: "enabled".to_string(),
            merge_method: "merge".to_string(),
            squash_option: "default_off".to_string(),
            shared_runners_enabled: true,
            public_jobs: true,
            lfs_enabled: true,
            request_access_enabled: true,
            build_timeout: 3600,
            ci_default_git_depth: Some(20),
            packages_enabled: Some(true),
            runners_token: Some(format!("GR1348941mock{id}")),
            created_at: Some(chrono::Utc::now()),
            ..Default::default()
        };
        apply_project_settings(&mut project, &opts.settings);
        lock(&self.projects).insert(id, project.clone());
        Ok(project)
    }

    async fn edit_project(&self, pid: i64, opts: &EditProjectOptions) -> Result<Project, GitLabError> {
        self.begin("edit_project", opts)?;
        let mut projects = lock(&self.projects);
        let project = projects.get_mut(&pid).ok_or_else(|| not_found(format!("Project {pid}")))?;
        if let Some(name) = &opts.name {
            project.name = name.clone();
        }
        if let Some(path) = &opts.path {
            project.path = path.clone();
        }
        apply_project_settings(project, &opts.settings);
        if opts.mirror_user_id.is_some() {
            project.mirror_user_id = opts.mirror_user_id;
        }
        if let Some(v) = opts.only_mirror_protected_branches {
            project.only_mirror_protected_branches = v;
        }
        if let Some(v) = opts.mirror_overwrites_diverged_branches {
            project.mirror_overwrites_diverged_branches = v;
        }
        Ok(project.clone())
    }

    async fn delete_project(&self, pid: i64, opts: &DeleteProjectOptions) -> Result<(), GitLabError> {
        self.begin("delete_project", &json!({ "pid": pid, "opts": opts }))?;
        let mut projects = lock(&self.projects);
        let project = projects.get_mut(&pid).ok_or_else(|| not_found(format!("Project {pid}")))?;
        if project.marked_for_deletion_on.is_none() {
            project.marked_for_deletion_on = Some(chrono::Utc::now().date_naive().to_string());
            return Ok(());
        }
        let confirmed = opts.permanently_remove == Some(true)
            && opts.full_path.as_deref() == Some(project.path_with_namespace.as_str());
        if !confirmed {
            return Err(bad_request("delete_project", "Project has been already marked for deletion"));
        }
        projects.remove(&pid);
        Ok(())
    }
}

fn apply_hook_options(hook: &mut ProjectHook, o: &ProjectHookOptions) {
    macro_rules! set {
        ($($field:ident),* $(,)?) => {
            $(if let Some(v) = o.$field { hook.$field = v; })*
        };
    }
    set!(
        push_events,
        issues_events,
        confidential_issues_events,
        merge_requests_events,
        tag_push_events,
        note_events,
        job_events,
        pipeline_events,
        wiki_page_events,
        deployment_events,
        releases_events,
        enable_ssl_verification,
    );
    if let Some(url) = &o.url {
        hook.url = url.clone();
    }
    if o.push_events_branch_filter.is_some() {
        hook.push_events_branch_filter = o.push_events_branch_filter.clone();
    }
    if o.confidential_note_events.is_some() {
        hook.confidential_note_events = o.confidential_note_events;
    }
}

#[async_trait::async_trait]
impl ProjectHooksApi for MockGitLabClient {
    async fn get_project_hook(&self, pid: i64, hook_id: i64) -> Result<ProjectHook, GitLabError> {
        self.begin("get_project_hook", &json!({ "pid": pid, "id": hook_id }))?;
        lock(&self.hooks)
            .get(&(pid, hook_id))
            .cloned()
            .ok_or_else(|| not_found(format!("Hook {hook_id}")))
    }

    async fn add_project_hook(&self, pid: i64, opts: &ProjectHookOptions) -> Result<ProjectHook, GitLabError> {
        self.begin("add_project_hook", opts)?;
        let mut hook = ProjectHook {
            id: self.next_id(),
            project_id: pid,
            push_events: true,
            enable_ssl_verification: true,
            created_at: Some(chrono::Utc::now()),
            ..Default::default()
        };
        apply_hook_options(&mut hook, opts);
        lock(&self.hooks).insert((pid, hook.id), hook.clone());
        Ok(hook)
    }

    async fn edit_project_hook(&self, pid: i64, hook_id: i64, opts: &ProjectHookOptions) -> Result<ProjectHook, GitLabError> {
        self.begin("edit_project_hook", opts)?;
        let mut hooks = lock(&self.hooks);
        let hook = hooks.get_mut(&(pid, hook_id)).ok_or_else(|| not_found(format!("Hook {hook_id}")))?;
        apply_hook_options(hook, opts);
        Ok(hook.clone())
    }

    async fn delete_project_hook(&self, pid: i64, hook_id: i64) -> Result<(), GitLabError> {
        self.begin("delete_project_hook", &json!({ "pid": pid, "id": hook_id }))?;
        lock(&self.hooks)
            .remove(&(pid, hook_id))
            .map(|_| ())
            .ok_or_else(|| not_found(format!("Hook {hook_id}")))
    }
}

#[async_trait::async_trait]
impl ProjectVariablesApi for MockGitLabClient {
    async fn get_variable(&self, pid: i64, key: &str, environment_scope: Option<&str>) -> Result<ProjectVariable, GitLabError> {
        self.begin("get_variable", &json!({ "pid": pid, "key": key, "scope": environment_scope }))?;
        lock(&self.variables)
            .get(&(pid, key.to_string()))
            .filter(|v| environment_scope.is_none_or(|scope| v.environment_scope == scope))
            .cloned()
            .ok_or_else(|| not_found(format!("Variable {key}")))
    }

    async fn create_variable(&self, pid: i64, opts: &CreateProjectVariableOptions) -> Result<ProjectVariable, GitLabError> {
        self.begin("create_variable", opts)?;
        let mut variables = lock(&self.variables);
        if variables.contains_key(&(pid, opts.key.clone())) {
            return Err(bad_request("create_variable", "key has already been taken"));
        }
        let variable = ProjectVariable {
            key: opts.key.clone(),
            value: opts.value.clone(),
            variable_type: opts.variable_type.clone().unwrap_or_else(|| "env_var".to_string()),
            protected: opts.protected.unwrap_or(false),
            masked: opts.masked.unwrap_or(false),
            raw: opts.raw.unwrap_or(false),
            environment_scope: opts.environment_scope.clone().unwrap_or_else(|| "*".to_string()),
            description: opts.description.clone(),
        };
        variables.insert((pid, opts.key.clone()), variable.clone());
        Ok(variable)
    }

    async fn update_variable(&self, pid: i64, key: &str, opts: &UpdateProjectVariableOptions) -> Result<ProjectVariable, GitLabError> {
        self.begin("update_variable", opts)?;
        let mut variables = lock(&self.variables);
        let variable = variables
            .get_mut(&(pid, key.to_string()))
            .ok_or_else(|| not_found(format!("Variable {key}")))?;
        if let Some(v) = &opts.value {
            variable.value = v.clone();
        }
        if let Some(v) = &opts.variable_type {
            variable.variable_type = v.clone();
        }
        if let Some(v) = opts.protected {
            variable.protected = v;
        }
        if let Some(v) = opts.masked {
            variable.masked = v;
        }
        if let Some(v) = opts.raw {
            variable.raw = v;
        }
        if let Some(v) = &opts.environment_scope {
            variable.environment_scope = v.clone();
        }
        if opts.description.is_some() {
            variable.description = opts.description.clone();
        }
        Ok(variable.clone())
    }

    async fn remove_variable(&self, pid: i64, key: &str, environment_scope: Option<&str>) -> Result<(), GitLabError> {
        self.begin("remove_variable", &json!({ "pid": pid, "key": key, "scope": environment_scope }))?;
        lock(&self.variables)
            .remove(&(pid, key.to_string()))
            .map(|_| ())
            .ok_or_else(|| not_found(format!("Variable {key}")))
    }
}

#[async_trait::async_trait]
impl ProjectMembersApi for MockGitLabClient {
    async fn get_project_member(&self, pid: i64, user_id: i64) -> Result<ProjectMember, GitLabError> {
        self.begin("get_project_member", &json!({ "pid": pid, "user_id": user_id }))?;
        lock(&self.members)
            .get(&(pid, user_id))
            .cloned()
            .ok_or_else(|| not_found(format!("Member {user_id}")))
    }

    async fn add_project_member(&self, pid: i64, opts: &AddProjectMemberOptions) -> Result<ProjectMember, GitLabError> {
        self.begin("add_project_member", opts)?;
        let member = ProjectMember {
            id: opts.user_id,
            username: format!("user{}", opts.user_id),
            name: format!("User {}", opts.user_id),
            state: "active".to_string(),
            web_url: format!("https://gitlab.mock/user{}", opts.user_id),
            access_level: opts.access_level,
            expires_at: opts.expires_at.clone(),
            member_role_id: opts.member_role_id,
            created_at: Some(chrono::Utc::now()),
            ..Default::default()
        };
        lock(&self.members).insert((pid, opts.user_id), member.clone());
        Ok(member)
    }

    async fn edit_project_member(&self, pid: i64, user_id: i64, opts: &EditProjectMemberOptions) -> Result<ProjectMember, GitLabError> {
        self.begin("edit_project_member", opts)?;
        let mut members = lock(&self.members);
        let member = members
            .get_mut(&(pid, user_id))
            .ok_or_else(|| not_found(format!("Member {user_id}")))?;
        member.access_level = opts.access_level;
        member.expires_at = opts.expires_at.clone();
        member.member_role_id = opts.member_role_id;
        Ok(member.clone())
    }

    async fn delete_project_member(&self, pid: i64, user_id: i64) -> Result<(), GitLabError> {
        self.begin("delete_project_member", &json!({ "pid": pid, "user_id": user_id }))?;
        lock(&self.members)
            .remove(&(pid, user_id))
            .map(|_| ())
            .ok_or_else(|| not_found(format!("Member {user_id}")))
    }
}

#[async_trait::async_trait]
impl DeployTokensApi for MockGitLabClient {
    async fn get_project_deploy_token(&self, pid: i64, token_id: i64) -> Result<DeployToken, GitLabError> {
        self.begin("get_project_deploy_token", &json!({ "pid": pid, "id": token_id }))?;
        lock(&self.deploy_tokens)
            .get(&(pid, token_id))
            .cloned()
            .ok_or_else(|| not_found(format!("Deploy token {token_id}")))
    }

    async fn create_project_deploy_token(&self, pid: i64, opts: &CreateDeployTokenOptions) -> Result<DeployToken, GitLabError> {
        self.begin("create_project_deploy_token", opts)?;
        let id = self.next_id();
        let stored = DeployToken {
            id,
            name: opts.name.clone(),
            username: opts
                .username
                .clone()
                .unwrap_or_else(|| format!("gitlab+deploy-token-{id}")),
            expires_at: opts.expires_at,
            scopes: opts.scopes.clone(),
            ..Default::default()
        };
        lock(&self.deploy_tokens).insert((pid, id), stored.clone());
        Ok(DeployToken {
            token: Some(format!("gldt-mock{id}")),
            ..stored
        })
    }

    async fn delete_project_deploy_token(&self, pid: i64, token_id: i64) -> Result<(), GitLabError> {
        self.begin("delete_project_deploy_token", &json!({ "pid": pid, "id": token_id }))?;
        lock(&self.deploy_tokens)
            .remove(&(pid, token_id))
            .map(|_| ())
            .ok_or_else(|| not_found(format!("Deploy token {token_id}")))
    }
}

#[async_trait::async_trait]
impl ProjectAccessTokensApi for MockGitLabClient {
    async fn get_project_access_token(&self, pid: i64, token_id: i64) -> Result<ProjectAccessToken, GitLabError> {
        self.begin("get_project_access_token", &json!({ "pid": pid, "id": token_id }))?;
        lock(&self.access_tokens)
            .get(&(pid, token_id))
            .cloned()
            .ok_or_else(|| not_found(format!("Access token {token_id}")))
    }

    async fn create_project_access_token(&self, pid: i64, opts: &CreateProjectAccessTokenOptions) -> Result<ProjectAccessToken, GitLabError> {
        self.begin("create_project_access_token", opts)?;
        let id = self.next_id();
        let stored = ProjectAccessToken {
            id,
            user_id: self.next_id(),
            name: opts.name.clone(),
            scopes: opts.scopes.clone(),
            access_level: opts.access_level.unwrap_or(40),
            active: true,
            created_at: Some(chrono::Utc::now()),
            expires_at: opts.expires_at.clone(),
            ..Default::default()
        };
        lock(&self.access_tokens).insert((pid, id), stored.clone());
        Ok(ProjectAccessToken {
            token: Some(format!("glpat-mock{id}")),
            ..stored
        })
    }

    async fn revoke_project_access_token(&self, pid: i64, token_id: i64) -> Result<(), GitLabError> {
        self.begin("revoke_project_access_token", &json!({ "pid": pid, "id": token_id }))?;
        let mut tokens = lock(&self.access_tokens);
        let token = tokens
            .get_mut(&(pid, token_id))
            .ok_or_else(|| not_found(format!("Access token {token_id}")))?;
        token.revoked = true;
        token.active = false;
        Ok(())
    }
}

fn apply_rule_options(rule: &mut ApprovalRule, o: &ApprovalRuleOptions) {
    if let Some(name) = &o.name {
        rule.name = name.clone();
    }
    if let Some(n) = o.approvals_required {
        rule.approvals_required = n;
    }
    if let Some(t) = &o.rule_type {
        rule.rule_type = t.clone();
    }
    if let Some(ids) = &o.user_ids {
        rule.users = ids
            .iter()
            .map(|id| BasicUser {
                id: *id,
                username: format!("user{id}"),
                name: format!("User {id}"),
            })
            .collect();
    }
    if let Some(ids) = &o.group_ids {
        rule.groups = ids
            .iter()
            .map(|id| BasicGroup {
                id: *id,
                name: format!("group{id}"),
                full_path: format!("group{id}"),
            })
            .collect();
    }
    if let Some(ids) = &o.protected_branch_ids {
        rule.protected_branches = ids
            .iter()
            .map(|id| ProtectedBranchRef {
                id: *id,
                name: format!("branch{id}"),
            })
            .collect();
    }
    if let Some(v) = o.applies_to_all_protected_branches {
        rule.applies_to_all_protected_branches = v;
    }
    rule.eligible_approvers = rule.users.clone();
}

#[async_trait::async_trait]
impl ApprovalRulesApi for MockGitLabClient {
    async fn get_project_approval_rule(&self, pid: i64, rule_id: i64) -> Result<ApprovalRule, GitLabError> {
        self.begin("get_project_approval_rule", &json!({ "pid": pid, "id": rule_id }))?;
        lock(&self.approval_rules)
            .get(&(pid, rule_id))
            .cloned()
            .ok_or_else(|| not_found(format!("Approval rule {rule_id}")))
    }

    async fn create_project_approval_rule(&self, pid: i64, opts: &ApprovalRuleOptions) -> Result<ApprovalRule, GitLabError> {
        self.begin("create_project_approval_rule", opts)?;
        let mut rule = ApprovalRule {
            id: self.next_id(),
            rule_type: "regular".to_string(),
            ..Default::default()
        };
        apply_rule_options(&mut rule, opts);
        lock(&self.approval_rules).insert((pid, rule.id), rule.clone());
        Ok(rule)
    }

    async fn update_project_approval_rule(&self, pid: i64, rule_id: i64, opts: &ApprovalRuleOptions) -> Result<ApprovalRule, GitLabError> {
        self.begin("update_project_approval_rule", opts)?;
        let mut rules = lock(&self.approval_rules);
        let rule = rules
            .get_mut(&(pid, rule_id))
            .ok_or_else(|| not_found(format!("Approval rule {rule_id}")))?;
        apply_rule_options(rule, opts);
        Ok(rule.clone())
    }

    async fn delete_project_approval_rule(&self, pid: i64, rule_id: i64) -> Result<(), GitLabError> {
        self.begin("delete_project_approval_rule", &json!({ "pid": pid, "id": rule_id }))?;
        lock(&self.approval_rules)
            .remove(&(pid, rule_id))
            .map(|_| ())
            .ok_or_else(|| not_found(format!("Approval rule {rule_id}")))
    }
}

fn access_list(
    level: Option<i64>,
    extra: Option<&Vec<BranchPermissionOptions>>,
) -> Vec<BranchAccessDescription> {
    let mut list: Vec<BranchAccessDescription> = level
        .into_iter()
        .map(|access_level| BranchAccessDescription {
            access_level,
            ..Default::default()
        })
        .collect();
    list.extend(extra.into_iter().flatten().map(|p| BranchAccessDescription {
        access_level: p.access_level.unwrap_or_default(),
        user_id: p.user_id,
        group_id: p.group_id,
        ..Default::default()
    }));
    list
}

#[async_trait::async_trait]
impl ProtectedBranchesApi for MockGitLabClient {
    async fn get_protected_branch(&self, pid: i64, branch: &str) -> Result<ProtectedBranch, GitLabError> {
        self.begin("get_protected_branch", &json!({ "pid": pid, "branch": branch }))?;
        lock(&self.protected_branches)
            .get(&(pid, branch.to_string()))
            .cloned()
            .ok_or_else(|| not_found(format!("Protected branch {branch}")))
    }

    async fn protect_repository_branches(&self, pid: i64, opts: &ProtectBranchOptions) -> Result<ProtectedBranch, GitLabError> {
        self.begin("protect_repository_branches", opts)?;
        let mut branches = lock(&self.protected_branches);
        if branches.contains_key(&(pid, opts.name.clone())) {
            return Err(conflict("protect_repository_branches", "Protected branch 'name' has already been taken"));
        }
        let branch = ProtectedBranch {
            id: self.next_id(),
            name: opts.name.clone(),
            push_access_levels: access_list(opts.push_access_level.or(Some(40)), opts.allowed_to_push.as_ref()),
            merge_access_levels: access_list(opts.merge_access_level.or(Some(40)), opts.allowed_to_merge.as_ref()),
            unprotect_access_levels: access_list(opts.unprotect_access_level, opts.allowed_to_unprotect.as_ref()),
            allow_force_push: opts.allow_force_push.unwrap_or(false),
            code_owner_approval_required: opts.code_owner_approval_required.unwrap_or(false),
        };
        branches.insert((pid, branch.name.clone()), branch.clone());
        Ok(branch)
    }

    async fn unprotect_repository_branches(&self, pid: i64, branch: &str) -> Result<(), GitLabError> {
        self.begin("unprotect_repository_branches", &json!({ "pid": pid, "branch": branch }))?;
        lock(&self.protected_branches)
            .remove(&(pid, branch.to_string()))
            .map(|_| ())
            .ok_or_else(|| not_found(format!("Protected branch {branch}")))
    }
}

#[async_trait::async_trait]
impl PipelineSchedulesApi for MockGitLabClient {
    async fn get_pipeline_schedule(&self, pid: i64, schedule_id: i64) -> Result<PipelineSchedule, GitLabError> {
        self.begin("get_pipeline_schedule", &json!({ "pid": pid, "id": schedule_id }))?;
        lock(&self.pipeline_schedules)
            .get(&(pid, schedule_id))
            .cloned()
            .ok_or_else(|| not_found(format!("Pipeline schedule {schedule_id}")))
    }

    async fn create_pipeline_schedule(&self, pid: i64, opts: &CreatePipelineScheduleOptions) -> Result<PipelineSchedule, GitLabError> {
        self.begin("create_pipeline_schedule", opts)?;
        let now = chrono::Utc::now();
        let schedule = PipelineSchedule {
            id: self.next_id(),
            description: opts.description.clone(),
            ref_name: opts.ref_name.clone(),
            cron: opts.cron.clone(),
            cron_timezone: opts.cron_timezone.clone().unwrap_or_else(|| "UTC".to_string()),
            active: opts.active.unwrap_or(true),
            created_at: Some(now),
            updated_at: Some(now),
            owner: Some(BasicUser {
                id: 1,
                username: "root".to_string(),
                name: "Administrator".to_string(),
            }),
            ..Default::default()
        };
        lock(&self.pipeline_schedules).insert((pid, schedule.id), schedule.clone());
        Ok(schedule)
    }

    async fn edit_pipeline_schedule(&self, pid: i64, schedule_id: i64, opts: &EditPipelineScheduleOptions) -> Result<PipelineSchedule, GitLabError> {
        self.begin("edit_pipeline_schedule", opts)?;
        let mut schedules = lock(&self.pipeline_schedules);
        let schedule = schedules
            .get_mut(&(pid, schedule_id))
            .ok_or_else(|| not_found(format!("Pipeline schedule {schedule_id}")))?;
        if let Some(v) = &opts.description {
            schedule.description = v.clone();
        }
        if let Some(v) = &opts.ref_name {
            schedule.ref_name = v.clone();
        }
        if let Some(v) = &opts.cron {
            schedule.cron = v.clone();
        }
        if let Some(v) = &opts.cron_timezone {
            schedule.cron_timezone = v.clone();
        }
        if let Some(v) = opts.active {
            schedule.active = v;
        }
        schedule.updated_at = Some(chrono::Utc::now());
        Ok(schedule.clone())
    }

    async fn delete_pipeline_schedule(&self, pid: i64, schedule_id: i64) -> Result<(), GitLabError> {
        self.begin("delete_pipeline_schedule", &json!({ "pid": pid, "id": schedule_id }))?;
        lock(&self.pipeline_schedules)
            .remove(&(pid, schedule_id))
            .map(|_| ())
            .ok_or_else(|| not_found(format!("Pipeline schedule {schedule_id}")))
    }

    async fn create_pipeline_schedule_variable(&self, pid: i64, schedule_id: i64, opts: &PipelineVariableOptions) -> Result<PipelineVariable, GitLabError> {
        self.begin("create_pipeline_schedule_variable", opts)?;
        let mut schedules = lock(&self.pipeline_schedules);
        let schedule = schedules
            .get_mut(&(pid, schedule_id))
            .ok_or_else(|| not_found(format!("Pipeline schedule {schedule_id}")))?;
        if schedule.variables.iter().any(|v| v.key == opts.key) {
            return Err(bad_request("create_pipeline_schedule_variable", "key has already been taken"));
        }
        let variable = PipelineVariable {
            key: opts.key.clone(),
            value: opts.value.clone(),
            variable_type: opts.variable_type.clone().unwrap_or_else(|| "env_var".to_string()),
        };
        schedule.variables.push(variable.clone());
        Ok(variable)
    }

    async fn edit_pipeline_schedule_variable(&self, pid: i64, schedule_id: i64, opts: &PipelineVariableOptions) -> Result<PipelineVariable, GitLabError> {
        self.begin("edit_pipeline_schedule_variable", opts)?;
        let mut schedules = lock(&self.pipeline_schedules);
        let schedule = schedules
            .get_mut(&(pid, schedule_id))
            .ok_or_else(|| not_found(format!("Pipeline schedule {schedule_id}")))?;
        let variable = schedule
            .variables
            .iter_mut()
            .find(|v| v.key == opts.key)
            .ok_or_else(|| not_found(format!("Variable {}", opts.key)))?;
        variable.value = opts.value.clone();
        if let Some(t) = &opts.variable_type {
            variable.variable_type = t.clone();
        }
        Ok(variable.clone())
    }

    async fn delete_pipeline_schedule_variable(&self, pid: i64, schedule_id: i64, key: &str) -> Result<(), GitLabError> {
        self.begin("delete_pipeline_schedule_variable", &json!({ "pid": pid, "id": schedule_id, "key": key }))?;
        let mut schedules = lock(&self.pipeline_schedules);
        let schedule = schedules
            .get_mut(&(pid, schedule_id))
            .ok_or_else(|| not_found(format!("Pipeline schedule {schedule_id}")))?;
        let before = schedule.variables.len();
        schedule.variables.retain(|v| v.key != key);
        if schedule.variables.len() == before {
            return Err(not_found(format!("Variable {key}")));
        }
        Ok(())
    }
}
