//! Group-scoped operations for MockGitLabClient

use super::{lock, not_found, MockGitLabClient};
use crate::error::GitLabError;
use crate::gitlab_trait::*;
use crate::models::*;
use serde_json::json;

fn apply_group_settings(group: &mut Group, s: &GroupSettings) {
    if s.description.is_some() {
        group.description = s.description.clone();
    }
    if let Some(v) = &s.visibility {
        group.visibility = v.clone();
    }
    if s.membership_lock.is_some() {
        group.membership_lock = s.membership_lock;
    }
    if let Some(v) = s.share_with_group_lock {
        group.share_with_group_lock = v;
    }
    if let Some(v) = s.require_two_factor_authentication {
        group.require_two_factor_authentication = v;
    }
    if let Some(v) = s.two_factor_grace_period {
        group.two_factor_grace_period = v;
    }
    if let Some(v) = &s.project_creation_level {
        group.project_creation_level = v.clone();
    }
    if let Some(v) = &s.subgroup_creation_level {
        group.subgroup_creation_level = v.clone();
    }
    if s.auto_devops_enabled.is_some() {
        group.auto_devops_enabled = s.auto_devops_enabled;
    }
    if s.emails_disabled.is_some() {
        group.emails_disabled = s.emails_disabled;
    }
    if s.mentions_disabled.is_some() {
        group.mentions_disabled = s.mentions_disabled;
    }
    if let Some(v) = s.lfs_enabled {
        group.lfs_enabled = v;
    }
    if let Some(v) = s.request_access_enabled {
        group.request_access_enabled = v;
    }
}

#[async_trait::async_trait]
impl GroupsApi for MockGitLabClient {
    async fn get_group(&self, gid: i64) -> Result<Group, GitLabError> {
        self.begin("get_group", &json!({ "gid": gid }))?;
        lock(&self.groups)
            .get(&gid)
            .cloned()
            .ok_or_else(|| not_found(format!("Group {gid}")))
    }

    async fn create_group(&self, opts: &CreateGroupOptions) -> Result<Group, GitLabError> {
        self.begin("create_group", opts)?;
        let id = self.next_id();
        let mut groups = lock(&self.groups);
        let (full_name, full_path) = match opts.parent_id.and_then(|p| groups.get(&p)) {
            Some(parent) => (
                format!("{} / {}", parent.full_name, opts.name),
                format!("{}/{}", parent.full_path, opts.path),
            ),
            None => (opts.name.clone(), opts.path.clone()),
        };
        let mut group = Group {
            id,
            name: opts.name.clone(),
            path: opts.path.clone(),
            visibility: "private".to_string(),
            web_url: format!("https://gitlab.mock/groups/{full_path}"),
            full_name,
            full_path,
            parent_id: opts.parent_id,
            two_factor_grace_period: 48,
            project_creation_level: "developer".to_string(),
            subgroup_creation_level: "maintainer".to_string(),
            lfs_enabled: true,
            request_access_enabled: true,
            created_at: Some(chrono::Utc::now()),
            runners_token: Some(format!("GR1348941group{id}")),
            ..Default::default()
        };
        apply_group_settings(&mut group, &opts.settings);
        groups.insert(id, group.clone());
        Ok(group)
    }

    async fn update_group(&self, gid: i64, opts: &UpdateGroupOptions) -> Result<Group, GitLabError> {
        self.begin("update_group", opts)?;
        let mut groups = lock(&self.groups);
        let group = groups.get_mut(&gid).ok_or_else(|| not_found(format!("Group {gid}")))?;
        if let Some(name) = &opts.name {
            group.name = name.clone();
        }
        if let Some(path) = &opts.path {
            group.path = path.clone();
        }
        apply_group_settings(group, &opts.settings);
        Ok(group.clone())
    }

    async fn delete_group(&self, gid: i64, opts: &DeleteGroupOptions) -> Result<(), GitLabError> {
        self.begin("delete_group", &json!({ "gid": gid, "opts": opts }))?;
        let mut groups = lock(&self.groups);
        let group = groups.get_mut(&gid).ok_or_else(|| not_found(format!("Group {gid}")))?;
        if group.marked_for_deletion_on.is_none() {
            group.marked_for_deletion_on = Some(chrono::Utc::now().date_naive().to_string());
            return Ok(());
        }
        let confirmed = opts.permanently_remove == Some(true)
            && opts.full_path.as_deref() == Some(group.full_path.as_str());
        if !confirmed {
            return Err(GitLabError::Api {
                method: "MOCK",
                path: "delete_group".to_string(),
                status: 400,
                message: "Group has been already marked for deletion".to_string(),
            });
        }
        groups.remove(&gid);
        Ok(())
    }
}

#[async_trait::async_trait]
impl GroupSamlLinksApi for MockGitLabClient {
    async fn get_group_saml_link(&self, gid: i64, name: &str) -> Result<SamlGroupLink, GitLabError> {
        self.begin("get_group_saml_link", &json!({ "gid": gid, "name": name }))?;
        lock(&self.saml_links)
            .get(&(gid, name.to_string()))
            .cloned()
            .ok_or_else(|| not_found(format!("SAML group link {name}")))
    }

    async fn add_group_saml_link(&self, gid: i64, opts: &AddSamlGroupLinkOptions) -> Result<SamlGroupLink, GitLabError> {
        self.begin("add_group_saml_link", opts)?;
        let link = SamlGroupLink {
            name: opts.saml_group_name.clone(),
            access_level: opts.access_level,
            member_role_id: opts.member_role_id,
        };
        lock(&self.saml_links).insert((gid, link.name.clone()), link.clone());
        Ok(link)
    }

    async fn delete_group_saml_link(&self, gid: i64, name: &str) -> Result<(), GitLabError> {
        self.begin("delete_group_saml_link", &json!({ "gid": gid, "name": name }))?;
        lock(&self.saml_links)
            .remove(&(gid, name.to_string()))
            .map(|_| ())
            .ok_or_else(|| not_found(format!("SAML group link {name}")))
    }
}

#[async_trait::async_trait]
impl GroupLdapLinksApi for MockGitLabClient {
    async fn list_group_ldap_links(&self, gid: i64) -> Result<Vec<LdapGroupLink>, GitLabError> {
        self.begin("list_group_ldap_links", &json!({ "gid": gid }))?;
        if !lock(&self.groups).contains_key(&gid) && !lock(&self.ldap_links).contains_key(&gid) {
            return Err(not_found(format!("Group {gid}")));
        }
        Ok(lock(&self.ldap_links).get(&gid).cloned().unwrap_or_default())
    }

    async fn add_group_ldap_link(&self, gid: i64, opts: &AddLdapGroupLinkOptions) -> Result<LdapGroupLink, GitLabError> {
        self.begin("add_group_ldap_link", opts)?;
        let link = LdapGroupLink {
            cn: Some(opts.cn.clone()),
            filter: None,
            group_access: opts.group_access,
            provider: opts.provider.clone(),
        };
        lock(&self.ldap_links).entry(gid).or_default().push(link.clone());
        Ok(link)
    }

    async fn delete_group_ldap_link(&self, gid: i64, provider: &str, cn: &str) -> Result<(), GitLabError> {
        self.begin("delete_group_ldap_link", &json!({ "gid": gid, "provider": provider, "cn": cn }))?;
        let mut links = lock(&self.ldap_links);
        let entries = links.get_mut(&gid).ok_or_else(|| not_found(format!("LDAP group link {cn}")))?;
        let before = entries.len();
        entries.retain(|l| !(l.provider == provider && l.cn.as_deref() == Some(cn)));
        if entries.len() == before {
            return Err(not_found(format!("LDAP group link {cn}")));
        }
        Ok(())
    }
}
