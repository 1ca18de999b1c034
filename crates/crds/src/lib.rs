//! GitLab Managed Resource CRD Definitions
//!
//! Kubernetes Custom Resource Definitions for the GitLab resource controller:
//! the managed resource kinds (projects and everything scoped under them,
//! groups and their SAML/LDAP links, runners) and the provider configs that
//! hold GitLab credentials.

pub mod error;
pub mod groups;
pub mod managed;
pub mod projects;
pub mod provider_config;
pub mod references;
pub mod runners;
pub mod values;

pub use error::CrdError;
pub use groups::*;
pub use managed::*;
pub use projects::*;
pub use provider_config::*;
pub use references::*;
pub use runners::*;
pub use values::*;

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::CustomResourceExt;

/// Every CRD served by the controller, provider configs first
pub fn all_crds() -> Vec<CustomResourceDefinition> {
    vec![
        ClusterProviderConfig::crd(),
        ProviderConfig::crd(),
        ProviderConfigUsage::crd(),
        Project::crd(),
        Hook::crd(),
        Variable::crd(),
        Member::crd(),
        DeployToken::crd(),
        AccessToken::crd(),
        ApprovalRule::crd(),
        ProtectedBranch::crd(),
        PipelineSchedule::crd(),
        Group::crd(),
        SamlGroupLink::crd(),
        LdapGroupLink::crd(),
        Runner::crd(),
    ]
}
