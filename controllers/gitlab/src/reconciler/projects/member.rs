//! Member external client and transformers
//!
//! The external-name is the member's user ID.

use crate::connector::ExternalContext;
use crate::error::ControllerError;
use crate::external::{ExternalClient, ExternalCreation, ExternalObservation, ExternalUpdate};
use crate::reconcile_helpers::{equal_if_set_opt, late_init_opt, parse_external_id, require_external_id};
use crate::reconciler::projects::project_id;
use crate::reconciler::{deleted, failed, found};
use async_trait::async_trait;
use crds::{Condition, Managed, Member, MemberObservation, MemberParameters};
use gitlab_client::{AddProjectMemberOptions, EditProjectMemberOptions, ProjectMember, ProjectMembersApi};

const KIND: &str = "Member";

pub fn add_options(p: &MemberParameters) -> AddProjectMemberOptions {
    AddProjectMemberOptions {
        user_id: p.user_id,
        access_level: p.access_level,
        expires_at: p.expires_at.clone(),
        member_role_id: p.member_role_id,
    }
}

pub fn edit_options(p: &MemberParameters) -> EditProjectMemberOptions {
    EditProjectMemberOptions {
        access_level: p.access_level,
        expires_at: p.expires_at.clone(),
        member_role_id: p.member_role_id,
    }
}

pub fn late_initialize(p: &mut MemberParameters, r: &ProjectMember) {
    late_init_opt(&mut p.expires_at, r.expires_at.clone());
    late_init_opt(&mut p.member_role_id, r.member_role_id);
}

pub fn is_up_to_date(p: &MemberParameters, r: &ProjectMember) -> bool {
    p.access_level == r.access_level
        && equal_if_set_opt(&p.expires_at, &r.expires_at)
        && equal_if_set_opt(&p.member_role_id, &r.member_role_id)
}

pub fn observation(r: &ProjectMember) -> MemberObservation {
    MemberObservation {
        username: Some(r.username.clone()),
        name: Some(r.name.clone()),
        state: Some(r.state.clone()),
        avatar_url: r.avatar_url.clone(),
        web_url: Some(r.web_url.clone()),
    }
}

/// External client for `Member`
pub struct MemberExternal<C> {
    client: C,
}

impl<C: ProjectMembersApi> MemberExternal<C> {
    pub fn new(client: C, _context: ExternalContext) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: ProjectMembersApi + 'static> ExternalClient<Member> for MemberExternal<C> {
    async fn observe(&self, cr: &mut Member) -> Result<ExternalObservation, ControllerError> {
        let pid = project_id(cr.spec.for_provider.project_id)?;
        let Some(user_id) = parse_external_id(cr.external_name())? else {
            return Ok(ExternalObservation::absent());
        };
        let Some(remote) = found(self.client.get_project_member(pid, user_id).await, KIND)? else {
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

    async fn create(&self, cr: &mut Member) -> Result<ExternalCreation, ControllerError> {
        let pid = project_id(cr.spec.for_provider.project_id)?;
        let member = self
            .client
            .add_project_member(pid, &add_options(&cr.spec.for_provider))
            .await
            .map_err(failed("create", KIND))?;
        cr.set_external_name(member.id.to_string());
        Ok(ExternalCreation::default())
    }

    async fn update(&self, cr: &mut Member) -> Result<ExternalUpdate, ControllerError> {
        let pid = project_id(cr.spec.for_provider.project_id)?;
        let user_id = require_external_id(cr.external_name())?;
        self.client
            .edit_project_member(pid, user_id, &edit_options(&cr.spec.for_provider))
            .await
            .map_err(failed("update", KIND))?;
        Ok(ExternalUpdate::default())
    }

    async fn delete(&self, cr: &mut Member) -> Result<(), ControllerError> {
        let pid = project_id(cr.spec.for_provider.project_id)?;
        let user_id = require_external_id(cr.external_name())?;
        deleted(self.client.delete_project_member(pid, user_id).await, KIND)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{context, record, MemorySecrets};
    use crds::MemberSpec;
    use gitlab_client::MockGitLabClient;

    fn member() -> Member {
        record(Member::new(
            "alice-developer",
            MemberSpec {
                resource: Default::default(),
                for_provider: MemberParameters {
                    project_id: Some(5),
                    user_id: 12,
                    access_level: 30,
                    ..Default::default()
                },
            },
        ))
    }

    #[tokio::test]
    async fn external_name_is_user_id() {
        let mock = MockGitLabClient::new();
        let external = MemberExternal::new(mock.clone(), context(MemorySecrets::default()));
        let mut cr = member();

        external.create(&mut cr).await.unwrap();
        assert_eq!(cr.external_name(), "12");

        let observation = external.observe(&mut cr).await.unwrap();
        assert!(observation.resource_up_to_date);
        let at_provider = &cr.status.as_ref().unwrap().at_provider;
        assert_eq!(at_provider.username.as_deref(), Some("user12"));
        assert_eq!(at_provider.state.as_deref(), Some("active"));
    }

    #[tokio::test]
    async fn access_level_drift_is_edited() {
        let mock = MockGitLabClient::new();
        let external = MemberExternal::new(mock.clone(), context(MemorySecrets::default()));
        let mut cr = member();
        external.create(&mut cr).await.unwrap();

        cr.spec.for_provider.access_level = 40;
        cr.spec.for_provider.expires_at = Some("2027-01-31".to_string());
        assert!(!external.observe(&mut cr).await.unwrap().resource_up_to_date);

        external.update(&mut cr).await.unwrap();
        let body = &mock.calls_to("edit_project_member")[0].body;
        assert_eq!(body["access_level"], 40);
        assert_eq!(body["expires_at"], "2027-01-31");
        assert!(external.observe(&mut cr).await.unwrap().resource_up_to_date);
    }

    #[tokio::test]
    async fn remote_errors_are_wrapped() {
        let mock = MockGitLabClient::new();
        let external = MemberExternal::new(mock.clone(), context(MemorySecrets::default()));
        let mut cr = member();
        cr.set_external_name("12");

        mock.fail_next("get_project_member", 404, "404 Not Found");
        assert!(!external.observe(&mut cr).await.unwrap().resource_exists);

        mock.fail_next("add_project_member", 403, "forbidden");
        let err = external.create(&mut cr).await.unwrap_err();
        assert_eq!(err.to_string(), "cannot create Member: MOCK add_project_member: 403 forbidden");
    }
}
