//! Runner operations for MockGitLabClient

use super::{lock, not_found, MockGitLabClient};
use crate::error::GitLabError;
use crate::gitlab_trait::RunnersApi;
use crate::models::*;
use serde_json::json;

#[async_trait::async_trait]
impl RunnersApi for MockGitLabClient {
    async fn get_runner_details(&self, runner_id: i64) -> Result<RunnerDetails, GitLabError> {
        self.begin("get_runner_details", &json!({ "id": runner_id }))?;
        lock(&self.runners)
            .get(&runner_id)
            .cloned()
            .ok_or_else(|| not_found(format!("Runner {runner_id}")))
    }

    async fn create_user_runner(&self, opts: &CreateUserRunnerOptions) -> Result<UserRunner, GitLabError> {
        self.begin("create_user_runner", opts)?;
        let id = self.next_id();
        let runner = RunnerDetails {
            id,
            description: opts.description.clone(),
            paused: opts.paused.unwrap_or(false),
            is_shared: opts.runner_type == "instance_type",
            runner_type: opts.runner_type.clone(),
            status: "never_contacted".to_string(),
            locked: opts.locked.unwrap_or(false),
            run_untagged: opts.run_untagged.unwrap_or(true),
            tag_list: opts.tag_list.clone().unwrap_or_default(),
            access_level: opts.access_level.clone().unwrap_or_else(|| "not_protected".to_string()),
            maximum_timeout: opts.maximum_timeout,
            maintenance_note: opts.maintenance_note.clone(),
            ..Default::default()
        };
        lock(&self.runners).insert(id, runner);
        Ok(UserRunner {
            id,
            token: format!("glrt-mock{id}"),
            token_expires_at: None,
        })
    }

    async fn update_runner_details(&self, runner_id: i64, opts: &UpdateRunnerDetailsOptions) -> Result<RunnerDetails, GitLabError> {
        self.begin("update_runner_details", opts)?;
        let mut runners = lock(&self.runners);
        let runner = runners
            .get_mut(&runner_id)
            .ok_or_else(|| not_found(format!("Runner {runner_id}")))?;
        if opts.description.is_some() {
            runner.description = opts.description.clone();
        }
        if let Some(v) = opts.paused {
            runner.paused = v;
        }
        if let Some(v) = opts.locked {
            runner.locked = v;
        }
        if let Some(v) = opts.run_untagged {
            runner.run_untagged = v;
        }
        if let Some(v) = &opts.tag_list {
            runner.tag_list = v.clone();
        }
        if let Some(v) = &opts.access_level {
            runner.access_level = v.clone();
        }
        if opts.maximum_timeout.is_some() {
            runner.maximum_timeout = opts.maximum_timeout;
        }
        if opts.maintenance_note.is_some() {
            runner.maintenance_note = opts.maintenance_note.clone();
        }
        Ok(runner.clone())
    }

    async fn delete_registered_runner_by_id(&self, runner_id: i64) -> Result<(), GitLabError> {
        self.begin("delete_registered_runner_by_id", &json!({ "id": runner_id }))?;
        lock(&self.runners)
            .remove(&runner_id)
            .map(|_| ())
            .ok_or_else(|| not_found(format!("Runner {runner_id}")))
    }
}
