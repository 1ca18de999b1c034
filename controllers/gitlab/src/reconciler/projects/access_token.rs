//! AccessToken external client and transformers
//!
//! Project access tokens cannot be edited; deleting one revokes it. A revoked
//! token is treated as gone.

use crate::connector::ExternalContext;
use crate::error::ControllerError;
use crate::external::{connection_detail, ExternalClient, ExternalCreation, ExternalObservation, ExternalUpdate};
use crate::reconcile_helpers::{format_time, late_init, late_init_opt, parse_external_id, require_external_id};
use crate::reconciler::projects::project_id;
use crate::reconciler::{deleted, failed, found, require_connection_secret};
use async_trait::async_trait;
use crds::{AccessToken, AccessTokenObservation, AccessTokenParameters, Condition, Managed};
use gitlab_client::{CreateProjectAccessTokenOptions, ProjectAccessToken, ProjectAccessTokensApi};
use tracing::warn;

const KIND: &str = "AccessToken";

/// Connection detail key for the token value
pub const TOKEN_KEY: &str = "token";

pub fn create_options(p: &AccessTokenParameters) -> CreateProjectAccessTokenOptions {
    CreateProjectAccessTokenOptions {
        name: p.name.clone(),
        scopes: p.scopes.clone(),
        access_level: p.access_level,
        expires_at: p.expires_at.clone(),
    }
}

pub fn late_initialize(p: &mut AccessTokenParameters, r: &ProjectAccessToken) {
    late_init(&mut p.access_level, r.access_level);
    late_init_opt(&mut p.expires_at, r.expires_at.clone());
}

pub fn observation(previous: &AccessTokenObservation, r: &ProjectAccessToken) -> AccessTokenObservation {
    AccessTokenObservation {
        user_id: Some(r.user_id),
        active: Some(r.active),
        created_at: format_time(r.created_at),
        expires_at: r.expires_at.clone().or_else(|| previous.expires_at.clone()),
        last_used_at: format_time(r.last_used_at).or_else(|| previous.last_used_at.clone()),
    }
}

/// External client for `AccessToken`
pub struct AccessTokenExternal<C> {
    client: C,
}

impl<C: ProjectAccessTokensApi> AccessTokenExternal<C> {
    pub fn new(client: C, _context: ExternalContext) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: ProjectAccessTokensApi + 'static> ExternalClient<AccessToken> for AccessTokenExternal<C> {
    async fn observe(&self, cr: &mut AccessToken) -> Result<ExternalObservation, ControllerError> {
        let pid = project_id(cr.spec.for_provider.project_id)?;
        let Some(id) = parse_external_id(cr.external_name())? else {
            return Ok(ExternalObservation::absent());
        };
        let Some(remote) = found(self.client.get_project_access_token(pid, id).await, KIND)? else {
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

    async fn create(&self, cr: &mut AccessToken) -> Result<ExternalCreation, ControllerError> {
        let pid = project_id(cr.spec.for_provider.project_id)?;
        require_connection_secret(cr)?;
        let token = self
            .client
            .create_project_access_token(pid, &create_options(&cr.spec.for_provider))
            .await
            .map_err(failed("create", KIND))?;
        cr.set_external_name(token.id.to_string());

        let connection_details = match token.token {
            Some(value) => connection_detail(TOKEN_KEY, value),
            None => {
                warn!(id = token.id, "access token created without a token value");
                Default::default()
            }
        };
        Ok(ExternalCreation { connection_details })
    }

    async fn update(&self, _cr: &mut AccessToken) -> Result<ExternalUpdate, ControllerError> {
        Ok(ExternalUpdate::default())
    }

    async fn delete(&self, cr: &mut AccessToken) -> Result<(), ControllerError> {
        let pid = project_id(cr.spec.for_provider.project_id)?;
        let id = require_external_id(cr.external_name())?;
        deleted(self.client.revoke_project_access_token(pid, id).await, KIND)
    }
}
