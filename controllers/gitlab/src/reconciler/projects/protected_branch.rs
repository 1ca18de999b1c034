//! ProtectedBranch external client and transformers
//!
//! The external-name is the branch name. GitLab has no edit call for the
//! protection rules, so an update unprotects the branch and protects it again
//! with the new rules.

use crate::connector::ExternalContext;
use crate::error::ControllerError;
use crate::external::{ExternalClient, ExternalCreation, ExternalObservation, ExternalUpdate};
use crate::reconcile_helpers::{equal_if_set, late_init, late_init_opt, multiset_equal, require_external_key};
use crate::reconciler::projects::project_id;
use crate::reconciler::{deleted, failed, found};
use async_trait::async_trait;
use crds::{
    BranchAccessObservation, BranchPermission, Condition, Managed, ProtectedBranch, ProtectedBranchObservation,
    ProtectedBranchParameters,
};
use gitlab_client::{
    BranchAccessDescription, BranchPermissionOptions, ProtectBranchOptions, ProtectedBranch as RemoteProtectedBranch,
    ProtectedBranchesApi,
};
use tracing::debug;

const KIND: &str = "ProtectedBranch";

fn permissions(list: &Option<Vec<BranchPermission>>) -> Option<Vec<BranchPermissionOptions>> {
    list.as_ref().map(|perms| {
        perms
            .iter()
            .map(|p| BranchPermissionOptions {
                user_id: p.user_id,
                group_id: p.group_id,
                access_level: p.access_level,
            })
            .collect()
    })
}

/// `POST /protected_branches` body for `branch`
pub fn protect_options(p: &ProtectedBranchParameters, branch: &str) -> ProtectBranchOptions {
    ProtectBranchOptions {
        name: branch.to_string(),
        push_access_level: p.push_access_level,
        merge_access_level: p.merge_access_level,
        unprotect_access_level: p.unprotect_access_level,
        allow_force_push: p.allow_force_push,
        code_owner_approval_required: p.code_owner_approval_required,
        allowed_to_push: permissions(&p.allowed_to_push),
        allowed_to_merge: permissions(&p.allowed_to_merge),
        allowed_to_unprotect: permissions(&p.allowed_to_unprotect),
    }
}

fn is_role(entry: &BranchAccessDescription) -> bool {
    entry.user_id.is_none() && entry.group_id.is_none()
}

fn role_level(entries: &[BranchAccessDescription]) -> Option<i64> {
    entries.iter().find(|e| is_role(e)).map(|e| e.access_level)
}

/// The role level, when set, must be among the role entries
fn level_matches(spec: Option<i64>, entries: &[BranchAccessDescription]) -> bool {
    spec.is_none_or(|level| entries.iter().any(|e| is_role(e) && e.access_level == level))
}

/// User and group grants compare as a multiset; role-only grants must be present
fn grants_match(spec: &Option<Vec<BranchPermission>>, entries: &[BranchAccessDescription]) -> bool {
    let Some(perms) = spec else {
        return true;
    };
    let desired: Vec<(Option<i64>, Option<i64>)> = perms
        .iter()
        .filter(|p| p.user_id.is_some() || p.group_id.is_some())
        .map(|p| (p.user_id, p.group_id))
        .collect();
    let observed: Vec<(Option<i64>, Option<i64>)> = entries
        .iter()
        .filter(|e| !is_role(e))
        .map(|e| (e.user_id, e.group_id))
        .collect();
    let roles_present = perms
        .iter()
        .filter(|p| p.user_id.is_none() && p.group_id.is_none())
        .all(|p| level_matches(p.access_level, entries));
    roles_present && multiset_equal(&desired, &observed)
}

pub fn late_initialize(p: &mut ProtectedBranchParameters, r: &RemoteProtectedBranch) {
    late_init_opt(&mut p.push_access_level, role_level(&r.push_access_levels));
    late_init_opt(&mut p.merge_access_level, role_level(&r.merge_access_levels));
    late_init_opt(&mut p.unprotect_access_level, role_level(&r.unprotect_access_levels));
    late_init(&mut p.allow_force_push, r.allow_force_push);
    late_init(&mut p.code_owner_approval_required, r.code_owner_approval_required);
}

pub fn is_up_to_date(p: &ProtectedBranchParameters, r: &RemoteProtectedBranch) -> bool {
    level_matches(p.push_access_level, &r.push_access_levels)
        && level_matches(p.merge_access_level, &r.merge_access_levels)
        && level_matches(p.unprotect_access_level, &r.unprotect_access_levels)
        && grants_match(&p.allowed_to_push, &r.push_access_levels)
        && grants_match(&p.allowed_to_merge, &r.merge_access_levels)
        && grants_match(&p.allowed_to_unprotect, &r.unprotect_access_levels)
        && equal_if_set(&p.allow_force_push, &r.allow_force_push)
        && equal_if_set(&p.code_owner_approval_required, &r.code_owner_approval_required)
}

fn access_observations(entries: &[BranchAccessDescription]) -> Vec<BranchAccessObservation> {
    entries
        .iter()
        .map(|e| BranchAccessObservation {
            access_level: e.access_level,
            access_level_description: e.access_level_description.clone(),
            user_id: e.user_id,
            group_id: e.group_id,
        })
        .collect()
}

pub fn observation(r: &RemoteProtectedBranch) -> ProtectedBranchObservation {
    ProtectedBranchObservation {
        id: Some(r.id),
        name: Some(r.name.clone()),
        push_access_levels: access_observations(&r.push_access_levels),
        merge_access_levels: access_observations(&r.merge_access_levels),
        unprotect_access_levels: access_observations(&r.unprotect_access_levels),
        allow_force_push: Some(r.allow_force_push),
        code_owner_approval_required: Some(r.code_owner_approval_required),
    }
}

/// External client for `ProtectedBranch`
pub struct ProtectedBranchExternal<C> {
    client: C,
}

impl<C: ProtectedBranchesApi> ProtectedBranchExternal<C> {
    pub fn new(client: C, _context: ExternalContext) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: ProtectedBranchesApi + 'static> ExternalClient<ProtectedBranch> for ProtectedBranchExternal<C> {
    async fn observe(&self, cr: &mut ProtectedBranch) -> Result<ExternalObservation, ControllerError> {
        let pid = project_id(cr.spec.for_provider.project_id)?;
        if cr.external_name().is_empty() {
            return Ok(ExternalObservation::absent());
        }
        let branch = cr.external_name().to_string();
        let Some(remote) = found(self.client.get_protected_branch(pid, &branch).await, KIND)? else {
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

    async fn create(&self, cr: &mut ProtectedBranch) -> Result<ExternalCreation, ControllerError> {
        let pid = project_id(cr.spec.for_provider.project_id)?;
        let params = &cr.spec.for_provider;
        let branch = self
            .client
            .protect_repository_branches(pid, &protect_options(params, &params.branch_name))
            .await
            .map_err(failed("create", KIND))?;
        cr.set_external_name(branch.name);
        Ok(ExternalCreation::default())
    }

    async fn update(&self, cr: &mut ProtectedBranch) -> Result<ExternalUpdate, ControllerError> {
        let pid = project_id(cr.spec.for_provider.project_id)?;
        let branch = require_external_key(cr.external_name())?.to_string();
        debug!(project = pid, branch = %branch, "replacing branch protection");
        self.client
            .unprotect_repository_branches(pid, &branch)
            .await
            .map_err(failed("update", KIND))?;
        self.client
            .protect_repository_branches(pid, &protect_options(&cr.spec.for_provider, &branch))
            .await
            .map_err(|e| ControllerError::remote("re-protect branch after update", e))?;
        Ok(ExternalUpdate::default())
    }

    async fn delete(&self, cr: &mut ProtectedBranch) -> Result<(), ControllerError> {
        let pid = project_id(cr.spec.for_provider.project_id)?;
        let branch = require_external_key(cr.external_name())?.to_string();
        deleted(self.client.unprotect_repository_branches(pid, &branch).await, KIND)
    }
}
