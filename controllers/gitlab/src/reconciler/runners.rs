//! Runner external client and transformers
//!
//! Runners are registered with `POST /user/runners`, which returns the
//! authentication token once. The external-name is the numeric runner ID.

use crate::connector::ExternalContext;
use crate::error::ControllerError;
use crate::external::{connection_detail, ExternalClient, ExternalCreation, ExternalObservation, ExternalUpdate};
use crate::reconcile_helpers::{
    enum_equal_if_set, equal_if_set, equal_if_set_opt, format_time, late_init, late_init_enum, late_init_list, late_init_opt,
    list_equal_if_set, parse_external_id, require_external_id,
};
use crate::reconciler::{deleted, failed, found, require_connection_secret};
use async_trait::async_trait;
use crds::{Condition, Managed, Runner, RunnerObservation, RunnerParameters, RunnerTypeValue};
use gitlab_client::{CreateUserRunnerOptions, RunnerDetails, RunnersApi, UpdateRunnerDetailsOptions};

const KIND: &str = "Runner";

/// Connection detail key for the runner authentication token
pub const TOKEN_KEY: &str = "token";

/// Registration body; the scope ID matching `runnerType` must be set
pub fn create_options(p: &RunnerParameters) -> Result<CreateUserRunnerOptions, ControllerError> {
    let (group_id, project_id) = match p.runner_type {
        RunnerTypeValue::Instance => (None, None),
        RunnerTypeValue::Group => (Some(p.group_id.ok_or(ControllerError::MissingIdentifier("GroupID"))?), None),
        RunnerTypeValue::Project => (None, Some(p.project_id.ok_or(ControllerError::MissingIdentifier("ProjectID"))?)),
    };
    Ok(CreateUserRunnerOptions {
        runner_type: p.runner_type.to_string(),
        group_id,
        project_id,
        description: p.description.clone(),
        paused: p.paused,
        locked: p.locked,
        run_untagged: p.run_untagged,
        tag_list: p.tag_list.clone(),
        access_level: p.access_level.map(|v| v.to_string()),
        maximum_timeout: p.maximum_timeout,
        maintenance_note: p.maintenance_note.clone(),
    })
}

pub fn update_options(p: &RunnerParameters) -> UpdateRunnerDetailsOptions {
    UpdateRunnerDetailsOptions {
        description: p.description.clone(),
        paused: p.paused,
        locked: p.locked,
        run_untagged: p.run_untagged,
        tag_list: p.tag_list.clone(),
        access_level: p.access_level.map(|v| v.to_string()),
        maximum_timeout: p.maximum_timeout,
        maintenance_note: p.maintenance_note.clone(),
    }
}

pub fn late_initialize(p: &mut RunnerParameters, r: &RunnerDetails) {
    late_init_opt(&mut p.description, r.description.clone());
    late_init(&mut p.paused, r.paused);
    late_init(&mut p.locked, r.locked);
    late_init(&mut p.run_untagged, r.run_untagged);
    late_init_list(&mut p.tag_list, &r.tag_list);
    late_init_enum(&mut p.access_level, &r.access_level);
    late_init_opt(&mut p.maximum_timeout, r.maximum_timeout);
    late_init_opt(&mut p.maintenance_note, r.maintenance_note.clone());
}

pub fn is_up_to_date(p: &RunnerParameters, r: &RunnerDetails) -> bool {
    equal_if_set_opt(&p.description, &r.description)
        && equal_if_set(&p.paused, &r.paused)
        && equal_if_set(&p.locked, &r.locked)
        && equal_if_set(&p.run_untagged, &r.run_untagged)
        && list_equal_if_set(&p.tag_list, &r.tag_list)
        && enum_equal_if_set(&p.access_level, &r.access_level)
        && equal_if_set_opt(&p.maximum_timeout, &r.maximum_timeout)
        && equal_if_set_opt(&p.maintenance_note, &r.maintenance_note)
}

/// `tokenExpiresAt` is only known from registration and is carried over
pub fn observation(previous: &RunnerObservation, r: &RunnerDetails) -> RunnerObservation {
    RunnerObservation {
        id: Some(r.id),
        is_shared: Some(r.is_shared),
        runner_type: Some(r.runner_type.clone()),
        online: r.online,
        status: Some(r.status.clone()),
        ip_address: r.ip_address.clone(),
        contacted_at: format_time(r.contacted_at),
        token_expires_at: previous.token_expires_at.clone(),
    }
}

/// External client for `Runner`
pub struct RunnerExternal<C> {
    client: C,
}

impl<C: RunnersApi> RunnerExternal<C> {
    pub fn new(client: C, _context: ExternalContext) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: RunnersApi + 'static> ExternalClient<Runner> for RunnerExternal<C> {
    async fn observe(&self, cr: &mut Runner) -> Result<ExternalObservation, ControllerError> {
        let Some(id) = parse_external_id(cr.external_name())? else {
            return Ok(ExternalObservation::absent());
        };
        let Some(remote) = found(self.client.get_runner_details(id).await, KIND)? else {
            return Ok(ExternalObservation::absent());
        };

        let up_to_date = is_up_to_date(&cr.spec.for_provider, &remote);
        let snapshot = cr.spec.for_provider.clone();
        late_initialize(&mut cr.spec.for_provider, &remote);
        let status = cr.status.get_or_insert_with(Default::default);
        status.at_provider = observation(&status.at_provider, &remote);
        cr.set_conditions([Condition::available()]);

        Ok(ExternalObservation {
            resource_exists: true,
            resource_up_to_date: up_to_date,
            resource_late_initialized: snapshot != cr.spec.for_provider,
            ..Default::default()
        })
    }

    async fn create(&self, cr: &mut Runner) -> Result<ExternalCreation, ControllerError> {
        let opts = create_options(&cr.spec.for_provider)?;
        require_connection_secret(cr)?;
        let runner = self
            .client
            .create_user_runner(&opts)
            .await
            .map_err(failed("create", KIND))?;
        cr.set_external_name(runner.id.to_string());
        cr.status.get_or_insert_with(Default::default).at_provider.token_expires_at =
            format_time(runner.token_expires_at);
        Ok(ExternalCreation {
            connection_details: connection_detail(TOKEN_KEY, runner.token),
        })
    }

    async fn update(&self, cr: &mut Runner) -> Result<ExternalUpdate, ControllerError> {
        let id = require_external_id(cr.external_name())?;
        self.client
            .update_runner_details(id, &update_options(&cr.spec.for_provider))
            .await
            .map_err(failed("update", KIND))?;
        Ok(ExternalUpdate::default())
    }

    async fn delete(&self, cr: &mut Runner) -> Result<(), ControllerError> {
        let id = require_external_id(cr.external_name())?;
        deleted(self.client.delete_registered_runner_by_id(id).await, KIND)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{context, record, MemorySecrets};
    use crds::{ResourceSpec, RunnerAccessLevelValue, RunnerSpec, SecretReference};
    use gitlab_client::MockGitLabClient;

    fn runner(runner_type: RunnerTypeValue) -> Runner {
        record(Runner::new(
            "build-runner",
            RunnerSpec {
                resource: ResourceSpec {
                    write_connection_secret_to_ref: Some(SecretReference {
                        name: "build-runner".to_string(),
                        namespace: None,
                    }),
                    ..Default::default()
                },
                for_provider: RunnerParameters {
                    runner_type,
                    group_id: None,
                    group_id_ref: None,
                    project_id: None,
                    project_id_ref: None,
                    description: Some("docker builds".to_string()),
                    paused: None,
                    locked: None,
                    run_untagged: None,
                    tag_list: Some(vec!["docker".to_string(), "linux".to_string()]),
                    access_level: None,
                    maximum_timeout: None,
                    maintenance_note: None,
                },
            },
        ))
    }

    fn external(mock: &MockGitLabClient) -> RunnerExternal<MockGitLabClient> {
        RunnerExternal::new(mock.clone(), context(MemorySecrets::default()))
    }

    #[tokio::test]
    async fn scope_id_must_match_runner_type() {
        let mock = MockGitLabClient::new();
        let err = external(&mock)
            .create(&mut runner(RunnerTypeValue::Group))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "GroupID is missing");

        let err = external(&mock)
            .create(&mut runner(RunnerTypeValue::Project))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "ProjectID is missing");
        assert!(mock.calls().is_empty());

        let mut cr = runner(RunnerTypeValue::Project);
        cr.spec.for_provider.project_id = Some(8);
        cr.spec.for_provider.group_id = Some(2);
        external(&mock).create(&mut cr).await.unwrap();
        let body = &mock.calls_to("create_user_runner")[0].body;
        assert_eq!(body["runner_type"], "project_type");
        assert_eq!(body["project_id"], 8);
        assert!(body.get("group_id").is_none());
    }

    #[tokio::test]
    async fn token_is_emitted_at_create_only() {
        let mock = MockGitLabClient::new();
        let mut cr = runner(RunnerTypeValue::Instance);

        let creation = external(&mock).create(&mut cr).await.unwrap();
        assert_eq!(cr.external_name(), "1001");
        assert_eq!(creation.connection_details, connection_detail(TOKEN_KEY, "glrt-mock1001"));

        cr.status.as_mut().unwrap().at_provider.token_expires_at = Some("2027-01-01T00:00:00Z".to_string());
        let observation = external(&mock).observe(&mut cr).await.unwrap();
        assert!(observation.resource_up_to_date);
        assert!(observation.connection_details.is_empty());
        let at_provider = &cr.status.as_ref().unwrap().at_provider;
        assert_eq!(at_provider.token_expires_at.as_deref(), Some("2027-01-01T00:00:00Z"));
        assert_eq!(at_provider.is_shared, Some(true));
        assert_eq!(cr.spec.for_provider.access_level, Some(RunnerAccessLevelValue::NotProtected));
    }

    #[tokio::test]
    async fn tag_order_does_not_matter() {
        let mock = MockGitLabClient::new();
        let mut cr = runner(RunnerTypeValue::Instance);
        external(&mock).create(&mut cr).await.unwrap();

        cr.spec.for_provider.tag_list = Some(vec!["linux".to_string(), "docker".to_string()]);
        assert!(external(&mock).observe(&mut cr).await.unwrap().resource_up_to_date);

        cr.spec.for_provider.paused = Some(true);
        assert!(!external(&mock).observe(&mut cr).await.unwrap().resource_up_to_date);
        external(&mock).update(&mut cr).await.unwrap();
        assert!(external(&mock).observe(&mut cr).await.unwrap().resource_up_to_date);

        external(&mock).delete(&mut cr).await.unwrap();
        assert!(!external(&mock).observe(&mut cr).await.unwrap().resource_exists);
    }
}
