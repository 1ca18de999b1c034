//! SamlGroupLink CRD
//!
//! Maps a SAML group to a GitLab group access level. The external-name is the
//! SAML group name.

use crate::managed::{ResourceSpec, ResourceStatus};
use crate::references::ResourceReference;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "groups.gitlab.crossplane.io",
    version = "v1alpha1",
    kind = "SamlGroupLink",
    namespaced,
    status = "SamlGroupLinkStatus",
    category = "crossplane",
    category = "managed",
    category = "gitlab",
    printcolumn = r#"{"name":"READY","type":"string","jsonPath":".status.conditions[?(@.type=='Ready')].status"}"#,
    printcolumn = r#"{"name":"SYNCED","type":"string","jsonPath":".status.conditions[?(@.type=='Synced')].status"}"#,
    printcolumn = r#"{"name":"EXTERNAL-NAME","type":"string","jsonPath":".metadata.annotations.crossplane\\.io/external-name"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct SamlGroupLinkSpec {
    #[serde(flatten)]
    pub resource: ResourceSpec,

    pub for_provider: SamlGroupLinkParameters,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SamlGroupLinkParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id_ref: Option<ResourceReference>,

    /// SAML group name
    pub name: String,

    pub access_level: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_role_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SamlGroupLinkObservation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SamlGroupLinkStatus {
    #[serde(flatten)]
    pub resource: ResourceStatus,

    #[serde(default)]
    pub at_provider: SamlGroupLinkObservation,
}

crate::impl_managed!(SamlGroupLink, SamlGroupLinkStatus);
