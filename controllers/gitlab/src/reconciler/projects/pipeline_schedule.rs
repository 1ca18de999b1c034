//! PipelineSchedule external client and transformers
//!
//! The external-name is the numeric schedule ID. Schedule variables are a
//! sub-collection GitLab edits one key at a time; they are reconciled with a
//! keyed diff after the schedule itself. Leaving `variables` unset leaves the
//! remote variables alone.

use crate::collection::{diff, CollectionDiff};
use crate::connector::ExternalContext;
use crate::error::ControllerError;
use crate::external::{ExternalClient, ExternalCreation, ExternalObservation, ExternalUpdate};
use crate::reconcile_helpers::{
    enum_equal_if_set, equal_if_set, format_time, late_init, parse_external_id, require_external_id,
};
use crate::reconciler::projects::project_id;
use crate::reconciler::{deleted, failed, found};
use async_trait::async_trait;
use crds::{
    Condition, LastPipelineObservation, Managed, PipelineSchedule, PipelineScheduleObservation,
    PipelineScheduleParameters, PipelineScheduleVariable, ScheduleOwnerObservation,
};
use gitlab_client::{
    CreatePipelineScheduleOptions, EditPipelineScheduleOptions, PipelineSchedule as RemotePipelineSchedule,
    PipelineSchedulesApi, PipelineVariable, PipelineVariableOptions,
};
use tracing::debug;

const KIND: &str = "PipelineSchedule";
const VARIABLE_KIND: &str = "PipelineSchedule variable";

pub fn create_options(p: &PipelineScheduleParameters) -> CreatePipelineScheduleOptions {
    CreatePipelineScheduleOptions {
        description: p.description.clone(),
        ref_name: p.ref_name.clone(),
        cron: p.cron.clone(),
        cron_timezone: p.cron_timezone.clone(),
        active: p.active,
    }
}

pub fn edit_options(p: &PipelineScheduleParameters) -> EditPipelineScheduleOptions {
    EditPipelineScheduleOptions {
        description: Some(p.description.clone()),
        ref_name: Some(p.ref_name.clone()),
        cron: Some(p.cron.clone()),
        cron_timezone: p.cron_timezone.clone(),
        active: p.active,
    }
}

fn variable_options(v: &PipelineScheduleVariable) -> PipelineVariableOptions {
    PipelineVariableOptions {
        key: v.key.clone(),
        value: v.value.clone(),
        variable_type: v.variable_type.map(|t| t.to_string()),
    }
}

/// Keyed diff of the desired variables against the schedule's
pub fn variable_changes<'a>(
    desired: &'a [PipelineScheduleVariable],
    observed: &'a [PipelineVariable],
) -> CollectionDiff<'a, PipelineScheduleVariable, PipelineVariable> {
    diff(
        desired,
        observed,
        |d| d.key.clone(),
        |o| o.key.clone(),
        |d, o| d.value == o.value && enum_equal_if_set(&d.variable_type, &o.variable_type),
    )
}

pub fn late_initialize(p: &mut PipelineScheduleParameters, r: &RemotePipelineSchedule) {
    late_init(&mut p.cron_timezone, r.cron_timezone.clone());
    late_init(&mut p.active, r.active);
}

pub fn is_up_to_date(p: &PipelineScheduleParameters, r: &RemotePipelineSchedule) -> bool {
    let variables_match = p
        .variables
        .as_ref()
        .is_none_or(|vars| variable_changes(vars, &r.variables).is_empty());
    p.description == r.description
        && p.ref_name == r.ref_name
        && p.cron == r.cron
        && equal_if_set(&p.cron_timezone, &r.cron_timezone)
        && equal_if_set(&p.active, &r.active)
        && variables_match
}

pub fn observation(r: &RemotePipelineSchedule) -> PipelineScheduleObservation {
    PipelineScheduleObservation {
        id: Some(r.id),
        next_run_at: format_time(r.next_run_at),
        created_at: format_time(r.created_at),
        updated_at: format_time(r.updated_at),
        owner: r.owner.as_ref().map(|o| ScheduleOwnerObservation {
            id: o.id,
            username: o.username.clone(),
            name: o.name.clone(),
        }),
        last_pipeline: r.last_pipeline.as_ref().map(|l| LastPipelineObservation {
            id: l.id,
            sha: l.sha.clone(),
            ref_name: l.ref_name.clone(),
            status: l.status.clone(),
        }),
    }
}

/// External client for `PipelineSchedule`
pub struct PipelineScheduleExternal<C> {
    client: C,
}

impl<C: PipelineSchedulesApi> PipelineScheduleExternal<C> {
    pub fn new(client: C, _context: ExternalContext) -> Self {
        Self { client }
    }

    /// Create, then update, then delete schedule variables
    async fn sync_variables(
        &self,
        pid: i64,
        schedule_id: i64,
        desired: &[PipelineScheduleVariable],
        observed: &[PipelineVariable],
    ) -> Result<(), ControllerError> {
        let changes = variable_changes(desired, observed);
        debug!(
            schedule = schedule_id,
            create = changes.create.len(),
            update = changes.update.len(),
            delete = changes.delete.len(),
            "syncing schedule variables"
        );
        for v in changes.create {
            self.client
                .create_pipeline_schedule_variable(pid, schedule_id, &variable_options(v))
                .await
                .map_err(failed("create", VARIABLE_KIND))?;
        }
        for v in changes.update {
            self.client
                .edit_pipeline_schedule_variable(pid, schedule_id, &variable_options(v))
                .await
                .map_err(failed("update", VARIABLE_KIND))?;
        }
        for v in changes.delete {
            deleted(
                self.client
                    .delete_pipeline_schedule_variable(pid, schedule_id, &v.key)
                    .await,
                VARIABLE_KIND,
            )?;
        }
        Ok(())
    }
}

#[async_trait]
impl<C: PipelineSchedulesApi + 'static> ExternalClient<PipelineSchedule> for PipelineScheduleExternal<C> {
    async fn observe(&self, cr: &mut PipelineSchedule) -> Result<ExternalObservation, ControllerError> {
        let pid = project_id(cr.spec.for_provider.project_id)?;
        let Some(id) = parse_external_id(cr.external_name())? else {
            return Ok(ExternalObservation::absent());
        };
        let Some(remote) = found(self.client.get_pipeline_schedule(pid, id).await, KIND)? else {
            return Ok(ExternalObservation::absent());
        };

        let up_to_date = is_up_to_date(&cr.spec.for_provider, &remote);
        let snapshot = cr.spec.for_provider.clone();
        late_initialize(&mut cr.spec.for_provider, &remote);
        cr.status.get_or_insert_with(Default::default).at_provider = observation(&remote);
        cr.set_conditions([Condition::available()]);

        Ok(ExternalObservation {
            resource_exists: true,
            resource_up_to_date: up_to_date,
            resource_late_initialized: snapshot != cr.spec.for_provider,
            ..Default::default()
        })
    }

    async fn create(&self, cr: &mut PipelineSchedule) -> Result<ExternalCreation, ControllerError> {
        let pid = project_id(cr.spec.for_provider.project_id)?;
        let schedule = self
            .client
            .create_pipeline_schedule(pid, &create_options(&cr.spec.for_provider))
            .await
            .map_err(failed("create", KIND))?;
        cr.set_external_name(schedule.id.to_string());

        if let Some(variables) = &cr.spec.for_provider.variables {
            self.sync_variables(pid, schedule.id, variables, &schedule.variables)
                .await?;
        }
        Ok(ExternalCreation::default())
    }

    async fn update(&self, cr: &mut PipelineSchedule) -> Result<ExternalUpdate, ControllerError> {
        let pid = project_id(cr.spec.for_provider.project_id)?;
        let id = require_external_id(cr.external_name())?;
        let schedule = self
            .client
            .edit_pipeline_schedule(pid, id, &edit_options(&cr.spec.for_provider))
            .await
            .map_err(failed("update", KIND))?;

        if let Some(variables) = &cr.spec.for_provider.variables {
            self.sync_variables(pid, id, variables, &schedule.variables).await?;
        }
        Ok(ExternalUpdate::default())
    }

    async fn delete(&self, cr: &mut PipelineSchedule) -> Result<(), ControllerError> {
        let pid = project_id(cr.spec.for_provider.project_id)?;
        let id = require_external_id(cr.external_name())?;
        deleted(self.client.delete_pipeline_schedule(pid, id).await, KIND)
    }
}
