//! DeployToken external client and transformers
//!
//! Deploy tokens cannot be edited. The token value is only returned at
//! create and is published once; observe never re-emits it.

use crate::connector::ExternalContext;
use crate::error::ControllerError;
use crate::external::{ConnectionDetails, ExternalClient, ExternalCreation, ExternalObservation, ExternalUpdate};
use crate::reconcile_helpers::{format_time, late_init, parse_external_id, require_external_id};
use crate::reconciler::projects::project_id;
use crate::reconciler::{deleted, failed, found, require_connection_secret};
use async_trait::async_trait;
use crds::{Condition, DeployToken, DeployTokenObservation, DeployTokenParameters, Managed};
use gitlab_client::{CreateDeployTokenOptions, DeployToken as RemoteDeployToken, DeployTokensApi};

const KIND: &str = "DeployToken";

/// Connection detail key for the token value
pub const TOKEN_KEY: &str = "token";
/// Connection detail key for the token's username
pub const USERNAME_KEY: &str = "username";

pub fn create_options(p: &DeployTokenParameters) -> CreateDeployTokenOptions {
    CreateDeployTokenOptions {
        name: p.name.clone(),
        scopes: p.scopes.clone(),
        expires_at: p.expires_at,
        username: p.username.clone(),
    }
}

pub fn late_initialize(p: &mut DeployTokenParameters, r: &RemoteDeployToken) {
    late_init(&mut p.username, r.username.clone());
}

/// The previous `expiresAt` is kept when GitLab omits it
pub fn observation(previous: &DeployTokenObservation, r: &RemoteDeployToken) -> DeployTokenObservation {
    DeployTokenObservation {
        username: Some(r.username.clone()),
        expires_at: format_time(r.expires_at).or_else(|| previous.expires_at.clone()),
        revoked: Some(r.revoked),
        expired: Some(r.expired),
    }
}

/// External client for `DeployToken`
pub struct DeployTokenExternal<C> {
    client: C,
}

impl<C: DeployTokensApi> DeployTokenExternal<C> {
    pub fn new(client: C, _context: ExternalContext) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: DeployTokensApi + 'static> ExternalClient<DeployToken> for DeployTokenExternal<C> {
    async fn observe(&self, cr: &mut DeployToken) -> Result<ExternalObservation, ControllerError> {
        let pid = project_id(cr.spec.for_provider.project_id)?;
        let Some(id) = parse_external_id(cr.external_name())? else {
            return Ok(ExternalObservation::absent());
        };
        let Some(remote) = found(self.client.get_project_deploy_token(pid, id).await, KIND)? else {
            return Ok(ExternalObservation::absent());
        };
        if remote.revoked {
            return Ok(ExternalObservation::absent());
        }

        let snapshot = cr.spec.for_provider.clone();
        late_initialize(&mut cr.spec.for_provider, &remote);
        let status = cr.status.get_or_insert_with(Default::default);
        status.at_provider = observation(&status.at_provider, &remote);
        cr.set_conditions([Condition::available()]);

        Ok(ExternalObservation {
            resource_exists: true,
            resource_up_to_date: true,
            resource_late_initialized: snapshot != cr.spec.for_provider,
            ..Default::default()
        })
    }

    async fn create(&self, cr: &mut DeployToken) -> Result<ExternalCreation, ControllerError> {
        let pid = project_id(cr.spec.for_provider.project_id)?;
        require_connection_secret(cr)?;
        let token = self
            .client
            .create_project_deploy_token(pid, &create_options(&cr.spec.for_provider))
            .await
            .map_err(failed("create", KIND))?;
        cr.set_external_name(token.id.to_string());

        let mut details = ConnectionDetails::new();
        details.insert(USERNAME_KEY.to_string(), token.username.into_bytes());
        if let Some(value) = token.token {
            details.insert(TOKEN_KEY.to_string(), value.into_bytes());
        }
        Ok(ExternalCreation {
            connection_details: details,
        })
    }

    async fn update(&self, _cr: &mut DeployToken) -> Result<ExternalUpdate, ControllerError> {
        Ok(ExternalUpdate::default())
    }

    async fn delete(&self, cr: &mut DeployToken) -> Result<(), ControllerError> {
        let pid = project_id(cr.spec.for_provider.project_id)?;
        let id = require_external_id(cr.external_name())?;
        deleted(self.client.delete_project_deploy_token(pid, id).await, KIND)
    }
}
