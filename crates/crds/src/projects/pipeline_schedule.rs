//! PipelineSchedule CRD
//!
//! A scheduled pipeline and its variables. Variables are reconciled as a
//! sub-collection keyed by variable key.

use crate::managed::{ResourceSpec, ResourceStatus};
use crate::references::ResourceReference;
use crate::values::VariableTypeValue;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "projects.gitlab.crossplane.io",
    version = "v1alpha1",
    kind = "PipelineSchedule",
    namespaced,
    status = "PipelineScheduleStatus",
    category = "crossplane",
    category = "managed",
    category = "gitlab",
    printcolumn = r#"{"name":"READY","type":"string","jsonPath":".status.conditions[?(@.type=='Ready')].status"}"#,
    printcolumn = r#"{"name":"SYNCED","type":"string","jsonPath":".status.conditions[?(@.type=='Synced')].status"}"#,
    printcolumn = r#"{"name":"CRON","type":"string","jsonPath":".spec.forProvider.cron"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct PipelineScheduleSpec {
    #[serde(flatten)]
    pub resource: ResourceSpec,

    pub for_provider: PipelineScheduleParameters,
}

/// Variable passed to scheduled pipelines
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PipelineScheduleVariable {
    pub key: String,

    pub value: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_type: Option<VariableTypeValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PipelineScheduleParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id_ref: Option<ResourceReference>,

    pub description: String,

    /// Branch or tag to run
    #[serde(rename = "ref")]
    pub ref_name: String,

    pub cron: String,

    /// IANA zone, `UTC` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron_timezone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,

    /// Unset leaves remote variables alone; an empty list removes them all
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Vec<PipelineScheduleVariable>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleOwnerObservation {
    pub id: i64,
    pub username: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LastPipelineObservation {
    pub id: i64,
    pub sha: String,
    #[serde(rename = "ref")]
    pub ref_name: String,
    pub status: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PipelineScheduleObservation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_run_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<ScheduleOwnerObservation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_pipeline: Option<LastPipelineObservation>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PipelineScheduleStatus {
    #[serde(flatten)]
    pub resource: ResourceStatus,

    #[serde(default)]
    pub at_provider: PipelineScheduleObservation,
}

crate::impl_managed!(PipelineSchedule, PipelineScheduleStatus);
