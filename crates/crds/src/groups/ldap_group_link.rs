//! LdapGroupLink CRD
//!
//! Maps an LDAP group (by CN) to a GitLab group access level. The
//! external-name is the CN.

use crate::managed::{ResourceSpec, ResourceStatus};
use crate::references::ResourceReference;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "groups.gitlab.crossplane.io",
    version = "v1alpha1",
    kind = "LdapGroupLink",
    namespaced,
    status = "LdapGroupLinkStatus",
    category = "crossplane",
    category = "managed",
    category = "gitlab",
    printcolumn = r#"{"name":"READY","type":"string","jsonPath":".status.conditions[?(@.type=='Ready')].status"}"#,
    printcolumn = r#"{"name":"SYNCED","type":"string","jsonPath":".status.conditions[?(@.type=='Synced')].status"}"#,
    printcolumn = r#"{"name":"EXTERNAL-NAME","type":"string","jsonPath":".metadata.annotations.crossplane\\.io/external-name"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct LdapGroupLinkSpec {
    #[serde(flatten)]
    pub resource: ResourceSpec,

    pub for_provider: LdapGroupLinkParameters,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LdapGroupLinkParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id_ref: Option<ResourceReference>,

    /// LDAP group CN
    pub cn: String,

    pub group_access: i64,

    /// LDAP provider ID, e.g. `ldapmain`
    pub ldap_provider: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LdapGroupLinkObservation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cn: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ldap_provider: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LdapGroupLinkStatus {
    #[serde(flatten)]
    pub resource: ResourceStatus,

    #[serde(default)]
    pub at_provider: LdapGroupLinkObservation,
}

crate::impl_managed!(LdapGroupLink, LdapGroupLinkStatus);
