//! Variable external client and transformers
//!
//! The external-name is the variable key. Values sourced from a secret are
//! masked and raw unless the spec sets those flags.

use crate::connector::ExternalContext;
use crate::error::ControllerError;
use crate::external::{ExternalClient, ExternalCreation, ExternalObservation, ExternalUpdate};
use crate::reconcile_helpers::{
    enum_equal_if_set, equal_if_set, equal_if_set_opt, late_init, late_init_enum, late_init_opt, require_external_key,
};
use crate::reconciler::projects::project_id;
use crate::reconciler::{deleted, failed, found};
use crate::secrets::{read_selector, SecretReader};
use async_trait::async_trait;
use crds::{Condition, Managed, Variable, VariableObservation, VariableParameters};
use gitlab_client::{CreateProjectVariableOptions, ProjectVariable, ProjectVariablesApi, UpdateProjectVariableOptions};
use kube::ResourceExt;
use std::sync::Arc;

const KIND: &str = "Variable";

/// `masked` and `raw` as sent to GitLab
fn flags(p: &VariableParameters) -> (Option<bool>, Option<bool>) {
    if p.value_secret_ref.is_some() {
        (Some(p.masked.unwrap_or(true)), Some(p.raw.unwrap_or(true)))
    } else {
        (p.masked, p.raw)
    }
}

pub fn create_options(p: &VariableParameters, value: String) -> CreateProjectVariableOptions {
    let (masked, raw) = flags(p);
    CreateProjectVariableOptions {
        key: p.key.clone(),
        value,
        variable_type: p.variable_type.map(|v| v.to_string()),
        protected: p.protected,
        masked,
        raw,
        environment_scope: p.environment_scope.clone(),
        description: p.description.clone(),
    }
}

pub fn update_options(p: &VariableParameters, value: String) -> UpdateProjectVariableOptions {
    let (masked, raw) = flags(p);
    UpdateProjectVariableOptions {
        value: Some(value),
        variable_type: p.variable_type.map(|v| v.to_string()),
        protected: p.protected,
        masked,
        raw,
        environment_scope: p.environment_scope.clone(),
        description: p.description.clone(),
    }
}

pub fn late_initialize(p: &mut VariableParameters, r: &ProjectVariable) {
    late_init_enum(&mut p.variable_type, &r.variable_type);
    late_init(&mut p.protected, r.protected);
    late_init(&mut p.masked, r.masked);
    late_init(&mut p.raw, r.raw);
    late_init(&mut p.environment_scope, r.environment_scope.clone());
    late_init_opt(&mut p.description, r.description.clone());
}

pub fn is_up_to_date(p: &VariableParameters, value: &str, r: &ProjectVariable) -> bool {
    let (masked, raw) = flags(p);
    value == r.value
        && enum_equal_if_set(&p.variable_type, &r.variable_type)
        && equal_if_set(&p.protected, &r.protected)
        && equal_if_set(&masked, &r.masked)
        && equal_if_set(&raw, &r.raw)
        && equal_if_set(&p.environment_scope, &r.environment_scope)
        && equal_if_set_opt(&p.description, &r.description)
}

pub fn observation(r: &ProjectVariable) -> VariableObservation {
    VariableObservation {
        key: Some(r.key.clone()),
        variable_type: Some(r.variable_type.clone()),
        protected: Some(r.protected),
        masked: Some(r.masked),
        raw: Some(r.raw),
        environment_scope: Some(r.environment_scope.clone()),
    }
}

/// External client for `Variable`
pub struct VariableExternal<C> {
    client: C,
    secrets: Arc<dyn SecretReader>,
}

impl<C: ProjectVariablesApi> VariableExternal<C> {
    pub fn new(client: C, context: ExternalContext) -> Self {
        Self {
            client,
            secrets: context.secrets,
        }
    }

    /// The secret-sourced value, else the inline one
    async fn value(&self, cr: &Variable) -> Result<String, ControllerError> {
        let params = &cr.spec.for_provider;
        match &params.value_secret_ref {
            Some(selector) => {
                let namespace = cr.namespace().unwrap_or_default();
                read_selector(self.secrets.as_ref(), selector, &namespace).await
            }
            None => Ok(params.value.clone().unwrap_or_default()),
        }
    }
}

#[async_trait]
impl<C: ProjectVariablesApi + 'static> ExternalClient<Variable> for VariableExternal<C> {
    async fn observe(&self, cr: &mut Variable) -> Result<ExternalObservation, ControllerError> {
        let pid = project_id(cr.spec.for_provider.project_id)?;
        if cr.external_name().is_empty() {
            return Ok(ExternalObservation::absent());
        }
        let key = cr.external_name().to_string();
        let scope = cr.spec.for_provider.environment_scope.clone();
        let Some(remote) = found(self.client.get_variable(pid, &key, scope.as_deref()).await, KIND)? else {
            return Ok(ExternalObservation::absent());
        };

        let value = self.value(cr).await?;
        let up_to_date = is_up_to_date(&cr.spec.for_provider, &value, &remote);
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

    async fn create(&self, cr: &mut Variable) -> Result<ExternalCreation, ControllerError> {
        let pid = project_id(cr.spec.for_provider.project_id)?;
        let value = self.value(cr).await?;
        let variable = self
            .client
            .create_variable(pid, &create_options(&cr.spec.for_provider, value))
            .await
            .map_err(failed("create", KIND))?;
        cr.set_external_name(variable.key);
        Ok(ExternalCreation::default())
    }

    async fn update(&self, cr: &mut Variable) -> Result<ExternalUpdate, ControllerError> {
        let pid = project_id(cr.spec.for_provider.project_id)?;
        let key = require_external_key(cr.external_name())?.to_string();
        let value = self.value(cr).await?;
        self.client
            .update_variable(pid, &key, &update_options(&cr.spec.for_provider, value))
            .await
            .map_err(failed("update", KIND))?;
        Ok(ExternalUpdate::default())
    }

    async fn delete(&self, cr: &mut Variable) -> Result<(), ControllerError> {
        let pid = project_id(cr.spec.for_provider.project_id)?;
        let key = require_external_key(cr.external_name())?.to_string();
        let scope = cr.spec.for_provider.environment_scope.clone();
        deleted(self.client.remove_variable(pid, &key, scope.as_deref()).await, KIND)
    }
}
