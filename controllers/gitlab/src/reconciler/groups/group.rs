//! Group external client and transformers
//!
//! The external-name is the numeric group ID. Deletion is two-step like
//! projects: the first delete marks the group, a permanent delete with the
//! full path removes it.

use crate::connector::ExternalContext;
use crate::error::ControllerError;
use crate::external::{connection_detail, ConnectionDetails, ExternalClient, ExternalCreation, ExternalObservation, ExternalUpdate};
use crate::reconcile_helpers::{
    enum_equal_if_set, equal_if_set, equal_if_set_opt, format_time, late_init, late_init_enum, late_init_opt,
    parse_external_id, require_external_id,
};
use crate::reconciler::{deleted, failed, found};
use async_trait::async_trait;
use crds::{Condition, Group, GroupObservation, GroupParameters, Managed};
use gitlab_client::{
    CreateGroupOptions, DeleteGroupOptions, Group as RemoteGroup, GroupSettings, GroupsApi, UpdateGroupOptions,
};
use kube::ResourceExt;
use tracing::debug;

const KIND: &str = "Group";

/// Connection detail key for the group's runner registration token
pub const RUNNERS_TOKEN_KEY: &str = "runnersToken";

fn settings(p: &GroupParameters) -> GroupSettings {
    GroupSettings {
        description: p.description.clone(),
        visibility: p.visibility.map(|v| v.to_string()),
        membership_lock: p.membership_lock,
        share_with_group_lock: p.share_with_group_lock,
        require_two_factor_authentication: p.require_two_factor_authentication,
        two_factor_grace_period: p.two_factor_grace_period,
        project_creation_level: p.project_creation_level.map(|v| v.to_string()),
        subgroup_creation_level: p.subgroup_creation_level.map(|v| v.to_string()),
        auto_devops_enabled: p.auto_devops_enabled,
        emails_disabled: p.emails_disabled,
        mentions_disabled: p.mentions_disabled,
        lfs_enabled: p.lfs_enabled,
        request_access_enabled: p.request_access_enabled,
    }
}

pub fn create_options(p: &GroupParameters) -> CreateGroupOptions {
    CreateGroupOptions {
        name: p.name.clone(),
        path: p.path.clone(),
        parent_id: p.parent_id,
        settings: settings(p),
    }
}

/// `PUT /groups/:id` body; `parentId` is never sent
pub fn update_options(p: &GroupParameters) -> UpdateGroupOptions {
    UpdateGroupOptions {
        name: Some(p.name.clone()),
        path: Some(p.path.clone()),
        settings: settings(p),
    }
}

pub fn late_initialize(p: &mut GroupParameters, r: &RemoteGroup) {
    late_init_opt(&mut p.description, r.description.clone().filter(|d| !d.is_empty()));
    late_init_enum(&mut p.visibility, &r.visibility);
    late_init_opt(&mut p.membership_lock, r.membership_lock);
    late_init(&mut p.share_with_group_lock, r.share_with_group_lock);
    late_init(&mut p.require_two_factor_authentication, r.require_two_factor_authentication);
    late_init(&mut p.two_factor_grace_period, r.two_factor_grace_period);
    late_init_enum(&mut p.project_creation_level, &r.project_creation_level);
    late_init_enum(&mut p.subgroup_creation_level, &r.subgroup_creation_level);
    late_init_opt(&mut p.auto_devops_enabled, r.auto_devops_enabled);
    late_init_opt(&mut p.emails_disabled, r.emails_disabled);
    late_init_opt(&mut p.mentions_disabled, r.mentions_disabled);
    late_init(&mut p.lfs_enabled, r.lfs_enabled);
    late_init(&mut p.request_access_enabled, r.request_access_enabled);
}

pub fn is_up_to_date(p: &GroupParameters, r: &RemoteGroup) -> bool {
    p.name == r.name
        && p.path == r.path
        && equal_if_set_opt(&p.description, &r.description)
        && enum_equal_if_set(&p.visibility, &r.visibility)
        && equal_if_set_opt(&p.membership_lock, &r.membership_lock)
        && equal_if_set(&p.share_with_group_lock, &r.share_with_group_lock)
        && equal_if_set(&p.require_two_factor_authentication, &r.require_two_factor_authentication)
        && equal_if_set(&p.two_factor_grace_period, &r.two_factor_grace_period)
        && enum_equal_if_set(&p.project_creation_level, &r.project_creation_level)
        && enum_equal_if_set(&p.subgroup_creation_level, &r.subgroup_creation_level)
        && equal_if_set_opt(&p.auto_devops_enabled, &r.auto_devops_enabled)
        && equal_if_set_opt(&p.emails_disabled, &r.emails_disabled)
        && equal_if_set_opt(&p.mentions_disabled, &r.mentions_disabled)
        && equal_if_set(&p.lfs_enabled, &r.lfs_enabled)
        && equal_if_set(&p.request_access_enabled, &r.request_access_enabled)
}

pub fn observation(r: &RemoteGroup) -> GroupObservation {
    GroupObservation {
        id: Some(r.id),
        full_name: Some(r.full_name.clone()),
        full_path: Some(r.full_path.clone()),
        web_url: Some(r.web_url.clone()),
        parent_id: r.parent_id,
        created_at: format_time(r.created_at),
        marked_for_deletion_on: r.marked_for_deletion_on.clone(),
    }
}

fn runners_token(r: &RemoteGroup) -> ConnectionDetails {
    r.runners_token
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(|t| connection_detail(RUNNERS_TOKEN_KEY, t))
        .unwrap_or_default()
}

/// External client for `Group`
pub struct GroupExternal<C> {
    client: C,
}

impl<C: GroupsApi> GroupExternal<C> {
    pub fn new(client: C, _context: ExternalContext) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: GroupsApi + 'static> ExternalClient<Group> for GroupExternal<C> {
    async fn observe(&self, cr: &mut Group) -> Result<ExternalObservation, ControllerError> {
        let Some(id) = parse_external_id(cr.external_name())? else {
            return Ok(ExternalObservation::absent());
        };
        let Some(remote) = found(self.client.get_group(id).await, KIND)? else {
            return Ok(ExternalObservation::absent());
        };
        cr.status.get_or_insert_with(Default::default).at_provider = observation(&remote);

        let pending_deletion = remote.marked_for_deletion_on.is_some()
            && cr.is_deleting()
            && cr.spec.for_provider.remove_finalizer_on_pending_deletion == Some(true);
        if pending_deletion {
            debug!(name = %cr.name_any(), "group is marked for deletion, releasing record");
            return Ok(ExternalObservation::absent());
        }

        let up_to_date = is_up_to_date(&cr.spec.for_provider, &remote);
        let snapshot = cr.spec.for_provider.clone();
        late_initialize(&mut cr.spec.for_provider, &remote);
        cr.set_conditions([Condition::available()]);

        Ok(ExternalObservation {
            resource_exists: true,
            resource_up_to_date: up_to_date,
            resource_late_initialized: snapshot != cr.spec.for_provider,
            connection_details: runners_token(&remote),
        })
    }

    async fn create(&self, cr: &mut Group) -> Result<ExternalCreation, ControllerError> {
        let group = self
            .client
            .create_group(&create_options(&cr.spec.for_provider))
            .await
            .map_err(failed("create", KIND))?;
        cr.set_external_name(group.id.to_string());
        Ok(ExternalCreation {
            connection_details: runners_token(&group),
        })
    }

    async fn update(&self, cr: &mut Group) -> Result<ExternalUpdate, ControllerError> {
        let id = require_external_id(cr.external_name())?;
        self.client
            .update_group(id, &update_options(&cr.spec.for_provider))
            .await
            .map_err(failed("update", KIND))?;
        Ok(ExternalUpdate::default())
    }

    async fn delete(&self, cr: &mut Group) -> Result<(), ControllerError> {
        let Some(id) = parse_external_id(cr.external_name())? else {
            return Ok(());
        };
        let at_provider = cr.status.as_ref().map(|s| s.at_provider.clone()).unwrap_or_default();

        if at_provider.marked_for_deletion_on.is_none() {
            deleted(self.client.delete_group(id, &DeleteGroupOptions::default()).await, KIND)?;
        }
        if cr.spec.for_provider.permanently_remove == Some(true) {
            let opts = DeleteGroupOptions {
                permanently_remove: Some(true),
                full_path: at_provider.full_path,
            };
            deleted(self.client.delete_group(id, &opts).await, KIND)?;
        }
        Ok(())
    }
}
