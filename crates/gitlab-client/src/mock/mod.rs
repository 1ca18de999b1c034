//! Mock GitLabClient for unit testing
//!
//! This module provides a mock implementation of every service trait that can
//! be used in unit tests without requiring a running GitLab instance.
//!
//! The mock is organized into domain-specific modules:
//! - `projects.rs` - projects and everything scoped under a project
//! - `groups.rs` - groups, SAML links, LDAP links
//! - `runners.rs` - runners
//!
//! Every call is recorded (operation name and JSON body) so tests can assert
//! on what was sent, and any operation can be told to fail once with a given
//! HTTP status.

mod groups;
mod projects;
mod runners;

use crate::error::GitLabError;
use crate::models::*;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Store<K, V> = Arc<Mutex<HashMap<K, V>>>;

/// A call received by the mock
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    pub operation: String,
    pub body: serde_json::Value,
}

/// Mock GitLabClient for testing
///
/// This mock stores resources in memory and can be configured to return
/// specific responses for testing different scenarios.
#[derive(Debug, Clone, Default)]
pub struct MockGitLabClient {
    pub(crate) projects: Store<i64, Project>,
    pub(crate) hooks: Store<(i64, i64), ProjectHook>,
    pub(crate) variables: Store<(i64, String), ProjectVariable>,
    pub(crate) members: Store<(i64, i64), ProjectMember>,
    pub(crate) deploy_tokens: Store<(i64, i64), DeployToken>,
    pub(crate) access_tokens: Store<(i64, i64), ProjectAccessToken>,
    pub(crate) approval_rules: Store<(i64, i64), ApprovalRule>,
    pub(crate) protected_branches: Store<(i64, String), ProtectedBranch>,
    pub(crate) pipeline_schedules: Store<(i64, i64), PipelineSchedule>,
    pub(crate) runners: Store<i64, RunnerDetails>,
    pub(crate) groups: Store<i64, Group>,
    pub(crate) saml_links: Store<(i64, String), SamlGroupLink>,
    pub(crate) ldap_links: Store<i64, Vec<LdapGroupLink>>,
    calls: Arc<Mutex<Vec<MockCall>>>,
    failures: Store<String, (u16, String)>,
    // Counter for generating IDs
    next_id: Arc<Mutex<i64>>,
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn not_found(what: impl std::fmt::Display) -> GitLabError {
    GitLabError::NotFound(format!("{what} not found"))
}

impl MockGitLabClient {
    /// Create a new, empty mock client
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call to `operation` fail with `status`
    pub fn fail_next(&self, operation: &str, status: u16, message: &str) {
        lock(&self.failures).insert(operation.to_string(), (status, message.to_string()));
    }

    /// All calls received so far, in order
    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.calls).clone()
    }

    /// Calls received for one operation
    pub fn calls_to(&self, operation: &str) -> Vec<MockCall> {
        lock(&self.calls)
            .iter()
            .filter(|c| c.operation == operation)
            .cloned()
            .collect()
    }

    /// Operation names received so far, in order
    pub fn operations(&self) -> Vec<String> {
        lock(&self.calls).iter().map(|c| c.operation.clone()).collect()
    }

    /// Record a call and return the injected failure for it, if any
    pub(crate) fn begin<B: Serialize + ?Sized>(
        &self,
        operation: &str,
        body: &B,
    ) -> Result<(), GitLabError> {
        lock(&self.calls).push(MockCall {
            operation: operation.to_string(),
            body: serde_json::to_value(body)?,
        });
        match lock(&self.failures).remove(operation) {
            None => Ok(()),
            Some((404, message)) => Err(GitLabError::NotFound(message)),
            Some((status, message)) => Err(GitLabError::Api {
                method: "MOCK",
                path: operation.to_string(),
                status,
                message,
            }),
        }
    }

    /// Generate next ID; generated IDs start above 1000 so fixtures can use small ones
    pub(crate) fn next_id(&self) -> i64 {
        let mut id = lock(&self.next_id);
        *id += 1;
        1000 + *id
    }

    // Test setup helpers

    /// Add a project to the mock store
    pub fn add_project(&self, project: Project) {
        lock(&self.projects).insert(project.id, project);
    }

    /// Look up a stored project
    pub fn project(&self, id: i64) -> Option<Project> {
        lock(&self.projects).get(&id).cloned()
    }

    /// Add a project hook to the mock store
    pub fn add_hook(&self, hook: ProjectHook) {
        lock(&self.hooks).insert((hook.project_id, hook.id), hook);
    }

    /// Add a project variable to the mock store
    pub fn add_variable(&self, pid: i64, variable: ProjectVariable) {
        lock(&self.variables).insert((pid, variable.key.clone()), variable);
    }

    /// Look up a stored project variable
    pub fn variable(&self, pid: i64, key: &str) -> Option<ProjectVariable> {
        lock(&self.variables).get(&(pid, key.to_string())).cloned()
    }

    /// Add a project member to the mock store
    pub fn add_member(&self, pid: i64, member: ProjectMember) {
        lock(&self.members).insert((pid, member.id), member);
    }

    /// Add a deploy token to the mock store
    pub fn add_deploy_token(&self, pid: i64, token: DeployToken) {
        lock(&self.deploy_tokens).insert((pid, token.id), token);
    }

    /// Add a project access token to the mock store
    pub fn add_access_token(&self, pid: i64, token: ProjectAccessToken) {
        lock(&self.access_tokens).insert((pid, token.id), token);
    }

    /// Add an approval rule to the mock store
    pub fn add_approval_rule(&self, pid: i64, rule: ApprovalRule) {
        lock(&self.approval_rules).insert((pid, rule.id), rule);
    }

    /// Add a protected branch to the mock store
    pub fn add_protected_branch(&self, pid: i64, branch: ProtectedBranch) {
        lock(&self.protected_branches).insert((pid, branch.name.clone()), branch);
    }

    /// Look up a stored protected branch
    pub fn protected_branch(&self, pid: i64, name: &str) -> Option<ProtectedBranch> {
        lock(&self.protected_branches).get(&(pid, name.to_string())).cloned()
    }

    /// Add a pipeline schedule to the mock store
    pub fn add_pipeline_schedule(&self, pid: i64, schedule: PipelineSchedule) {
        lock(&self.pipeline_schedules).insert((pid, schedule.id), schedule);
    }

    /// Look up a stored pipeline schedule
    pub fn pipeline_schedule(&self, pid: i64, id: i64) -> Option<PipelineSchedule> {
        lock(&self.pipeline_schedules).get(&(pid, id)).cloned()
    }

    /// Add a runner to the mock store
    pub fn add_runner(&self, runner: RunnerDetails) {
        lock(&self.runners).insert(runner.id, runner);
    }

    /// Add a group to the mock store
    pub fn add_group(&self, group: Group) {
        lock(&self.groups).insert(group.id, group);
    }

    /// Look up a stored group
    pub fn group(&self, id: i64) -> Option<Group> {
        lock(&self.groups).get(&id).cloned()
    }

    /// Add a SAML group link to the mock store
    pub fn add_saml_link(&self, gid: i64, link: SamlGroupLink) {
        lock(&self.saml_links).insert((gid, link.name.clone()), link);
    }

    /// Add an LDAP group link to the mock store
    pub fn add_ldap_link(&self, gid: i64, link: LdapGroupLink) {
        lock(&self.ldap_links).entry(gid).or_default().push(link);
    }
}

