//! LdapGroupLink external client and transformers
//!
//! The external-name is the LDAP common name. GitLab only lists a group's
//! LDAP links, so observe searches the list for the CN.

use crate::connector::ExternalContext;
use crate::error::ControllerError;
use crate::external::{ExternalClient, ExternalCreation, ExternalObservation, ExternalUpdate};
use crate::reconcile_helpers::require_external_key;
use crate::reconciler::groups::group_id;
use crate::reconciler::{deleted, failed, found};
use async_trait::async_trait;
use crds::{Condition, LdapGroupLink, LdapGroupLinkObservation, LdapGroupLinkParameters, Managed};
use gitlab_client::{is_not_found, AddLdapGroupLinkOptions, GroupLdapLinksApi, LdapGroupLink as RemoteLdapGroupLink};

const KIND: &str = "LdapGroupLink";

pub fn add_options(p: &LdapGroupLinkParameters, cn: &str) -> AddLdapGroupLinkOptions {
    AddLdapGroupLinkOptions {
        cn: cn.to_string(),
        group_access: p.group_access,
        provider: p.ldap_provider.clone(),
    }
}

pub fn is_up_to_date(p: &LdapGroupLinkParameters, r: &RemoteLdapGroupLink) -> bool {
    p.group_access == r.group_access && p.ldap_provider == r.provider
}

/// Provider the link currently lives under, which may differ from the desired one
fn current_provider(cr: &LdapGroupLink) -> String {
    cr.status
        .as_ref()
        .and_then(|s| s.at_provider.ldap_provider.clone())
        .unwrap_or_else(|| cr.spec.for_provider.ldap_provider.clone())
}

/// External client for `LdapGroupLink`
pub struct LdapGroupLinkExternal<C> {
    client: C,
}

impl<C: GroupLdapLinksApi> LdapGroupLinkExternal<C> {
    pub fn new(client: C, _context: ExternalContext) -> Self {
        Self { client }
    }

    async fn find(&self, gid: i64, cn: &str) -> Result<Option<RemoteLdapGroupLink>, ControllerError> {
        let links = found(self.client.list_group_ldap_links(gid).await, KIND)?;
        Ok(links
            .into_iter()
            .flatten()
            .find(|link| link.cn.as_deref() == Some(cn)))
    }
}

#[async_trait]
impl<C: GroupLdapLinksApi + 'static> ExternalClient<LdapGroupLink> for LdapGroupLinkExternal<C> {
    async fn observe(&self, cr: &mut LdapGroupLink) -> Result<ExternalObservation, ControllerError> {
        let gid = group_id(cr.spec.for_provider.group_id)?;
        if cr.external_name().is_empty() {
            return Ok(ExternalObservation::absent());
        }
        let cn = cr.external_name().to_string();
        let Some(remote) = self.find(gid, &cn).await? else {
            return Ok(ExternalObservation::absent());
        };

        cr.status.get_or_insert_with(Default::default).at_provider = LdapGroupLinkObservation {
            cn: remote.cn.clone(),
            ldap_provider: Some(remote.provider.clone()),
        };
        cr.set_conditions([Condition::available()]);

        Ok(ExternalObservation {
            resource_exists: true,
            resource_up_to_date: is_up_to_date(&cr.spec.for_provider, &remote),
            ..Default::default()
        })
    }

    async fn create(&self, cr: &mut LdapGroupLink) -> Result<ExternalCreation, ControllerError> {
        let gid = group_id(cr.spec.for_provider.group_id)?;
        let params = &cr.spec.for_provider;
        self.client
            .add_group_ldap_link(gid, &add_options(params, &params.cn))
            .await
            .map_err(failed("create", KIND))?;
        let cn = cr.spec.for_provider.cn.clone();
        cr.set_external_name(cn);
        Ok(ExternalCreation::default())
    }

    async fn update(&self, cr: &mut LdapGroupLink) -> Result<ExternalUpdate, ControllerError> {
        let gid = group_id(cr.spec.for_provider.group_id)?;
        let cn = require_external_key(cr.external_name())?.to_string();
        let provider = current_provider(cr);
        match self.client.delete_group_ldap_link(gid, &provider, &cn).await {
            Err(e) if !is_not_found(&e) => return Err(ControllerError::remote(format!("update {KIND}"), e)),
            _ => {}
        }
        self.client
            .add_group_ldap_link(gid, &add_options(&cr.spec.for_provider, &cn))
            .await
            .map_err(|e| ControllerError::remote("re-create LDAP group link after update", e))?;
        Ok(ExternalUpdate::default())
    }

    async fn delete(&self, cr: &mut LdapGroupLink) -> Result<(), ControllerError> {
        let gid = group_id(cr.spec.for_provider.group_id)?;
        let cn = require_external_key(cr.external_name())?.to_string();
        let provider = current_provider(cr);
        deleted(self.client.delete_group_ldap_link(gid, &provider, &cn).await, KIND)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{context, record, MemorySecrets};
    use crds::LdapGroupLinkSpec;
    use gitlab_client::MockGitLabClient;

    fn link() -> LdapGroupLink {
        record(LdapGroupLink::new(
            "ops-ldap",
            LdapGroupLinkSpec {
                resource: Default::default(),
                for_provider: LdapGroupLinkParameters {
                    group_id: Some(6),
                    group_id_ref: None,
                    cn: "ops".to_string(),
                    group_access: 30,
                    ldap_provider: "ldapmain".to_string(),
                },
            },
        ))
    }

    fn external(mock: &MockGitLabClient) -> LdapGroupLinkExternal<MockGitLabClient> {
        LdapGroupLinkExternal::new(mock.clone(), context(MemorySecrets::default()))
    }

    #[tokio::test]
    async fn observe_finds_link_by_cn() {
        let mock = MockGitLabClient::new();
        mock.add_ldap_link(
            6,
            RemoteLdapGroupLink {
                cn: Some("dev".to_string()),
                filter: None,
                group_access: 30,
                provider: "ldapmain".to_string(),
            },
        );
        let mut cr = link();
        cr.set_external_name("ops");
        assert!(!external(&mock).observe(&mut cr).await.unwrap().resource_exists);

        external(&mock).create(&mut cr).await.unwrap();
        let observation = external(&mock).observe(&mut cr).await.unwrap();
        assert!(observation.resource_exists);
        assert!(observation.resource_up_to_date);
        assert_eq!(
            cr.status.as_ref().unwrap().at_provider.ldap_provider.as_deref(),
            Some("ldapmain")
        );
    }

    #[tokio::test]
    async fn missing_group_means_missing_link() {
        let mock = MockGitLabClient::new();
        let mut cr = link();
        cr.set_external_name("ops");
        assert!(!external(&mock).observe(&mut cr).await.unwrap().resource_exists);
    }

    #[tokio::test]
    async fn update_recreates_link() {
        let mock = MockGitLabClient::new();
        let mut cr = link();
        external(&mock).create(&mut cr).await.unwrap();
        external(&mock).observe(&mut cr).await.unwrap();

        cr.spec.for_provider.group_access = 40;
        assert!(!external(&mock).observe(&mut cr).await.unwrap().resource_up_to_date);
        external(&mock).update(&mut cr).await.unwrap();
        assert_eq!(mock.calls_to("delete_group_ldap_link")[0].body["provider"], "ldapmain");
        assert!(external(&mock).observe(&mut cr).await.unwrap().resource_up_to_date);

        mock.fail_next("add_group_ldap_link", 400, "bad cn");
        let err = external(&mock).update(&mut cr).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot re-create LDAP group link after update: MOCK add_group_ldap_link: 400 bad cn"
        );
    }

    #[tokio::test]
    async fn delete_follows_observed_provider() {
        let mock = MockGitLabClient::new();
        let mut cr = link();
        external(&mock).create(&mut cr).await.unwrap();
        external(&mock).observe(&mut cr).await.unwrap();

        cr.spec.for_provider.ldap_provider = "ldapsecondary".to_string();
        assert!(external(&mock).observe(&mut cr).await.unwrap().resource_exists);
        external(&mock).delete(&mut cr).await.unwrap();
        assert_eq!(mock.calls_to("delete_group_ldap_link")[0].body["provider"], "ldapmain");
        assert!(!external(&mock).observe(&mut cr).await.unwrap().resource_exists);
    }
}
