//! Variable CRD
//!
//! A project CI/CD variable. The external-name is the variable key. The value
//! is either inline or read from a secret; secret-sourced values are masked
//! and raw unless the user says otherwise.

use crate::managed::{ResourceSpec, ResourceStatus};
use crate::references::{ResourceReference, SecretKeySelector};
use crate::values::VariableTypeValue;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "projects.gitlab.crossplane.io",
    version = "v1alpha1",
    kind = "Variable",
    namespaced,
    status = "VariableStatus",
    category = "crossplane",
    category = "managed",
    category = "gitlab",
    printcolumn = r#"{"name":"READY","type":"string","jsonPath":".status.conditions[?(@.type=='Ready')].status"}"#,
    printcolumn = r#"{"name":"SYNCED","type":"string","jsonPath":".status.conditions[?(@.type=='Synced')].status"}"#,
    printcolumn = r#"{"name":"EXTERNAL-NAME","type":"string","jsonPath":".metadata.annotations.crossplane\\.io/external-name"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct VariableSpec {
    #[serde(flatten)]
    pub resource: ResourceSpec,

    pub for_provider: VariableParameters,
}

/// Desired state of a project variable
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VariableParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id_ref: Option<ResourceReference>,

    /// Variable key; only used at create, the external-name addresses the variable afterwards
    pub key: String,

    /// Inline value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Secret key holding the value; takes precedence over `value`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_secret_ref: Option<SecretKeySelector>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_type: Option<VariableTypeValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protected: Option<bool>,

    /// Hide the value in job logs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub masked: Option<bool>,

    /// Do not expand `$` references in the value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<bool>,

    /// Environment scope, `*` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_scope: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VariableObservation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protected: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub masked: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_scope: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VariableStatus {
    #[serde(flatten)]
    pub resource: ResourceStatus,

    #[serde(default)]
    pub at_provider: VariableObservation,
}

crate::impl_managed!(Variable, VariableStatus);
