//! Hook external client and transformers
//!
//! The external-name is the numeric hook ID. The secret token is written on
//! create and update but never compared, GitLab does not return it.

use crate::connector::ExternalContext;
use crate::error::ControllerError;
use crate::external::{ExternalClient, ExternalCreation, ExternalObservation, ExternalUpdate};
use crate::reconcile_helpers::{
    equal_if_set, equal_if_set_opt, format_time, late_init, late_init_opt, parse_external_id,
    require_external_id,
};
use crate::reconciler::projects::project_id;
use crate::reconciler::{deleted, failed, found};
use crate::secrets::{read_selector, SecretReader};
use async_trait::async_trait;
use crds::{Condition, Hook, HookObservation, HookParameters, Managed};
use gitlab_client::{ProjectHook, ProjectHookOptions, ProjectHooksApi};
use kube::ResourceExt;
use std::sync::Arc;

const KIND: &str = "Hook";

/// `POST`/`PUT` body; `token` is the value read from `tokenSecretRef`
pub fn hook_options(p: &HookParameters, token: Option<String>) -> ProjectHookOptions {
    ProjectHookOptions {
        url: Some(p.url.clone()),
        token,
        push_events: p.push_events,
        push_events_branch_filter: p.push_events_branch_filter.clone(),
        issues_events: p.issues_events,
        confidential_issues_events: p.confidential_issues_events,
        merge_requests_events: p.merge_requests_events,
        tag_push_events: p.tag_push_events,
        note_events: p.note_events,
        confidential_note_events: p.confidential_note_events,
        job_events: p.job_events,
        pipeline_events: p.pipeline_events,
        wiki_page_events: p.wiki_page_events,
        deployment_events: p.deployment_events,
        releases_events: p.releases_events,
        enable_ssl_verification: p.enable_ssl_verification,
    }
}

pub fn late_initialize(p: &mut HookParameters, r: &ProjectHook) {
    late_init(&mut p.push_events, r.push_events);
    late_init_opt(&mut p.push_events_branch_filter, r.push_events_branch_filter.clone());
    late_init(&mut p.issues_events, r.issues_events);
    late_init(&mut p.confidential_issues_events, r.confidential_issues_events);
    late_init(&mut p.merge_requests_events, r.merge_requests_events);
    late_init(&mut p.tag_push_events, r.tag_push_events);
    late_init(&mut p.note_events, r.note_events);
    late_init_opt(&mut p.confidential_note_events, r.confidential_note_events);
    late_init(&mut p.job_events, r.job_events);
    late_init(&mut p.pipeline_events, r.pipeline_events);
    late_init(&mut p.wiki_page_events, r.wiki_page_events);
    late_init(&mut p.deployment_events, r.deployment_events);
    late_init(&mut p.releases_events, r.releases_events);
    late_init(&mut p.enable_ssl_verification, r.enable_ssl_verification);
}

pub fn is_up_to_date(p: &HookParameters, r: &ProjectHook) -> bool {
    p.url == r.url
        && equal_if_set(&p.push_events, &r.push_events)
        && equal_if_set_opt(&p.push_events_branch_filter, &r.push_events_branch_filter)
        && equal_if_set(&p.issues_events, &r.issues_events)
        && equal_if_set(&p.confidential_issues_events, &r.confidential_issues_events)
        && equal_if_set(&p.merge_requests_events, &r.merge_requests_events)
        && equal_if_set(&p.tag_push_events, &r.tag_push_events)
        && equal_if_set(&p.note_events, &r.note_events)
        && equal_if_set_opt(&p.confidential_note_events, &r.confidential_note_events)
        && equal_if_set(&p.job_events, &r.job_events)
        && equal_if_set(&p.pipeline_events, &r.pipeline_events)
        && equal_if_set(&p.wiki_page_events, &r.wiki_page_events)
        && equal_if_set(&p.deployment_events, &r.deployment_events)
        && equal_if_set(&p.releases_events, &r.releases_events)
        && equal_if_set(&p.enable_ssl_verification, &r.enable_ssl_verification)
}

pub fn observation(r: &ProjectHook) -> HookObservation {
    HookObservation {
        id: Some(r.id),
        url: Some(r.url.clone()),
        created_at: format_time(r.created_at),
    }
}

/// External client for `Hook`
pub struct HookExternal<C> {
    client: C,
    secrets: Arc<dyn SecretReader>,
}

impl<C: ProjectHooksApi> HookExternal<C> {
    pub fn new(client: C, context: ExternalContext) -> Self {
        Self {
            client,
            secrets: context.secrets,
        }
    }

    async fn options(&self, cr: &Hook) -> Result<ProjectHookOptions, ControllerError> {
        let params = &cr.spec.for_provider;
        let token = match &params.token_secret_ref {
            Some(selector) => {
                let namespace = cr.namespace().unwrap_or_default();
                Some(read_selector(self.secrets.as_ref(), selector, &namespace).await?)
            }
            None => None,
        };
        Ok(hook_options(params, token))
    }
}

#[async_trait]
impl<C: ProjectHooksApi + 'static> ExternalClient<Hook> for HookExternal<C> {
    async fn observe(&self, cr: &mut Hook) -> Result<ExternalObservation, ControllerError> {
        let pid = project_id(cr.spec.for_provider.project_id)?;
        let Some(id) = parse_external_id(cr.external_name())? else {
            return Ok(ExternalObservation::absent());
        };
        let Some(remote) = found(self.client.get_project_hook(pid, id).await, KIND)? else {
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

    async fn create(&self, cr: &mut Hook) -> Result<ExternalCreation, ControllerError> {
        let pid = project_id(cr.spec.for_provider.project_id)?;
        let opts = self.options(cr).await?;
        let hook = self
            .client
            .add_project_hook(pid, &opts)
            .await
            .map_err(failed("create", KIND))?;
        cr.set_external_name(hook.id.to_string());
        Ok(ExternalCreation::default())
    }

    async fn update(&self, cr: &mut Hook) -> Result<ExternalUpdate, ControllerError> {
        let pid = project_id(cr.spec.for_provider.project_id)?;
        let id = require_external_id(cr.external_name())?;
        let opts = self.options(cr).await?;
        self.client
            .edit_project_hook(pid, id, &opts)
            .await
            .map_err(failed("update", KIND))?;
        Ok(ExternalUpdate::default())
    }

    async fn delete(&self, cr: &mut Hook) -> Result<(), ControllerError> {
        let pid = project_id(cr.spec.for_provider.project_id)?;
        let id = require_external_id(cr.external_name())?;
        deleted(self.client.delete_project_hook(pid, id).await, KIND)
    }
}
