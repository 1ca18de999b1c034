//! SamlGroupLink external client and transformers
//!
//! The external-name is the SAML group name. Links cannot be edited, an
//! update removes the link and adds it back.

use crate::connector::ExternalContext;
use crate::error::ControllerError;
use crate::external::{ExternalClient, ExternalCreation, ExternalObservation, ExternalUpdate};
use crate::reconcile_helpers::{equal_if_set_opt, late_init_opt, require_external_key};
use crate::reconciler::groups::group_id;
use crate::reconciler::{deleted, failed, found};
use async_trait::async_trait;
use crds::{Condition, Managed, SamlGroupLink, SamlGroupLinkObservation, SamlGroupLinkParameters};
use gitlab_client::{AddSamlGroupLinkOptions, GroupSamlLinksApi, SamlGroupLink as RemoteSamlGroupLink};

const KIND: &str = "SamlGroupLink";

pub fn add_options(p: &SamlGroupLinkParameters, name: &str) -> AddSamlGroupLinkOptions {
    AddSamlGroupLinkOptions {
        saml_group_name: name.to_string(),
        access_level: p.access_level,
        member_role_id: p.member_role_id,
    }
}

pub fn late_initialize(p: &mut SamlGroupLinkParameters, r: &RemoteSamlGroupLink) {
    late_init_opt(&mut p.member_role_id, r.member_role_id);
}

pub fn is_up_to_date(p: &SamlGroupLinkParameters, r: &RemoteSamlGroupLink) -> bool {
    p.access_level == r.access_level && equal_if_set_opt(&p.member_role_id, &r.member_role_id)
}

/// External client for `SamlGroupLink`
pub struct SamlGroupLinkExternal<C> {
    client: C,
}

impl<C: GroupSamlLinksApi> SamlGroupLinkExternal<C> {
    pub fn new(client: C, _context: ExternalContext) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: GroupSamlLinksApi + 'static> ExternalClient<SamlGroupLink> for SamlGroupLinkExternal<C> {
    async fn observe(&self, cr: &mut SamlGroupLink) -> Result<ExternalObservation, ControllerError> {
        let gid = group_id(cr.spec.for_provider.group_id)?;
        if cr.external_name().is_empty() {
            return Ok(ExternalObservation::absent());
        }
        let name = cr.external_name().to_string();
        let Some(remote) = found(self.client.get_group_saml_link(gid, &name).await, KIND)? else {
            return Ok(ExternalObservation::absent());
        };

        let up_to_date = is_up_to_date(&cr.spec.for_provider, &remote);
        let snapshot = cr.spec.for_provider.clone();
        late_initialize(&mut cr.spec.for_provider, &remote);
        cr.status.get_or_insert_with(Default::default).at_provider = SamlGroupLinkObservation {
            name: Some(remote.name),
        };
        cr.set_conditions([Condition::available()]);

        Ok(ExternalObservation {
            resource_exists: true,
            resource_up_to_date: up_to_date,
            resource_late_initialized: snapshot != cr.spec.for_provider,
            ..Default::default()
        })
    }

    async fn create(&self, cr: &mut SamlGroupLink) -> Result<ExternalCreation, ControllerError> {
        let gid = group_id(cr.spec.for_provider.group_id)?;
        let params = &cr.spec.for_provider;
        let link = self
            .client
            .add_group_saml_link(gid, &add_options(params, &params.name))
            .await
            .map_err(failed("create", KIND))?;
        cr.set_external_name(link.name);
        Ok(ExternalCreation::default())
    }

    async fn update(&self, cr: &mut SamlGroupLink) -> Result<ExternalUpdate, ControllerError> {
        let gid = group_id(cr.spec.for_provider.group_id)?;
        let name = require_external_key(cr.external_name())?.to_string();
        self.client
            .delete_group_saml_link(gid, &name)
            .await
            .map_err(failed("update", KIND))?;
        self.client
            .add_group_saml_link(gid, &add_options(&cr.spec.for_provider, &name))
            .await
            .map_err(|e| ControllerError::remote("re-create SAML group link after update", e))?;
        Ok(ExternalUpdate::default())
    }

    async fn delete(&self, cr: &mut SamlGroupLink) -> Result<(), ControllerError> {
        let gid = group_id(cr.spec.for_provider.group_id)?;
        let name = require_external_key(cr.external_name())?.to_string();
        deleted(self.client.delete_group_saml_link(gid, &name).await, KIND)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{context, record, MemorySecrets};
    use crds::SamlGroupLinkSpec;
    use gitlab_client::MockGitLabClient;

    fn link(group_id: Option<i64>) -> SamlGroupLink {
        record(SamlGroupLink::new(
            "engineering-saml",
            SamlGroupLinkSpec {
                resource: Default::default(),
                for_provider: SamlGroupLinkParameters {
                    group_id,
                    group_id_ref: None,
                    name: "Engineering".to_string(),
                    access_level: 30,
                    member_role_id: None,
                },
            },
        ))
    }

    fn external(mock: &MockGitLabClient) -> SamlGroupLinkExternal<MockGitLabClient> {
        SamlGroupLinkExternal::new(mock.clone(), context(MemorySecrets::default()))
    }

    #[tokio::test]
    async fn update_recreates_link() {
        let mock = MockGitLabClient::new();
        let mut cr = link(Some(2));
        external(&mock).create(&mut cr).await.unwrap();
        assert_eq!(cr.external_name(), "Engineering");
        assert!(external(&mock).observe(&mut cr).await.unwrap().resource_up_to_date);

        cr.spec.for_provider.access_level = 40;
        assert!(!external(&mock).observe(&mut cr).await.unwrap().resource_up_to_date);
        external(&mock).update(&mut cr).await.unwrap();
        assert_eq!(
            mock.operations()[mock.operations().len() - 2..],
            ["delete_group_saml_link", "add_group_saml_link"]
        );
        assert!(external(&mock).observe(&mut cr).await.unwrap().resource_up_to_date);
    }

    #[tokio::test]
    async fn failed_recreate_is_reported_distinctly() {
        let mock = MockGitLabClient::new();
        let mut cr = link(Some(2));
        external(&mock).create(&mut cr).await.unwrap();

        mock.fail_next("add_group_saml_link", 500, "boom");
        let err = external(&mock).update(&mut cr).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot re-create SAML group link after update: MOCK add_group_saml_link: 500 boom"
        );
        assert_eq!(cr.external_name(), "Engineering");
    }

    #[tokio::test]
    async fn group_id_is_required() {
        let mock = MockGitLabClient::new();
        let err = external(&mock).create(&mut link(None)).await.unwrap_err();
        assert_eq!(err.to_string(), "GroupID is missing");
    }
}
