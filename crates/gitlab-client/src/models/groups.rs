//! Group-scoped models: groups, SAML group links, LDAP group links.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// GitLab group
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub path: String,
    pub description: Option<String>,
    pub visibility: String,
    pub full_name: String,
    pub full_path: String,
    pub web_url: String,
    pub parent_id: Option<i64>,
    pub membership_lock: Option<bool>,
    pub share_with_group_lock: bool,
    pub require_two_factor_authentication: bool,
    pub two_factor_grace_period: i64,
    pub project_creation_level: String,
    pub subgroup_creation_level: String,
    pub auto_devops_enabled: Option<bool>,
    pub emails_disabled: Option<bool>,
    pub mentions_disabled: Option<bool>,
    pub lfs_enabled: bool,
    pub request_access_enabled: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub marked_for_deletion_on: Option<String>,
    pub runners_token: Option<String>,
}

/// Settings shared by group creation and update requests
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub membership_lock: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_with_group_lock: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require_two_factor_authentication: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub two_factor_grace_period: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_creation_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subgroup_creation_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_devops_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emails_disabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mentions_disabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lfs_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_access_enabled: Option<bool>,
}

/// `POST /groups`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateGroupOptions {
    pub name: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
    #[serde(flatten)]
    pub settings: GroupSettings,
}

/// `PUT /groups/:id`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateGroupOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(flatten)]
    pub settings: GroupSettings,
}

/// `DELETE /groups/:id` query parameters, same two-step semantics as projects
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteGroupOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permanently_remove: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_path: Option<String>,
}

/// SAML group link
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamlGroupLink {
    pub name: String,
    pub access_level: i64,
    pub member_role_id: Option<i64>,
}

/// `POST /groups/:id/saml_group_links`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddSamlGroupLinkOptions {
    pub saml_group_name: String,
    pub access_level: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_role_id: Option<i64>,
}

/// LDAP group link
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LdapGroupLink {
    pub cn: Option<String>,
    pub filter: Option<String>,
    pub group_access: i64,
    pub provider: String,
}

/// `POST /groups/:id/ldap_group_links`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddLdapGroupLinkOptions {
    pub cn: String,
    pub group_access: i64,
    pub provider: String,
}
