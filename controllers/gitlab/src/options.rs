//! Process configuration read from the environment.

use crate::error::ControllerError;
use std::str::FromStr;
use std::time::Duration;

/// Controller-wide options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerOptions {
    /// Namespace to watch; all namespaces when unset
    pub watch_namespace: Option<String>,
    /// Requeue interval after a successful reconcile
    pub poll_interval: Duration,
    /// Concurrent reconciles per kind
    pub max_concurrent_reconciles: u16,
    /// Honour `spec.managementPolicies`; when off every record is treated as `["*"]`
    pub enable_management_policies: bool,
    /// Wait for each CRD to be established before starting its watcher
    pub enable_crd_gating: bool,
    /// Accept `group/project` paths as Project external-names and rewrite them to IDs
    pub project_path_external_names: bool,
    /// Port of the metrics and probe server
    pub metrics_port: u16,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            watch_namespace: None,
            poll_interval: Duration::from_secs(60),
            max_concurrent_reconciles: 3,
            enable_management_policies: true,
            enable_crd_gating: false,
            project_path_external_names: false,
            metrics_port: 8080,
        }
    }
}

impl ControllerOptions {
    /// Load options from process environment variables
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load options from any key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ControllerError> {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Ok(Self {
            watch_namespace: get("WATCH_NAMESPACE"),
            poll_interval: parse::<u64>(&get, "POLL_INTERVAL_SECONDS")?
                .map_or(defaults.poll_interval, Duration::from_secs),
            max_concurrent_reconciles: parse(&get, "MAX_CONCURRENT_RECONCILES")?
                .unwrap_or(defaults.max_concurrent_reconciles),
            enable_management_policies: parse(&get, "ENABLE_MANAGEMENT_POLICIES")?
                .unwrap_or(defaults.enable_management_policies),
            enable_crd_gating: parse(&get, "ENABLE_CRD_GATING")?.unwrap_or(defaults.enable_crd_gating),
            project_path_external_names: parse(&get, "PROJECT_PATH_EXTERNAL_NAMES")?
                .unwrap_or(defaults.project_path_external_names),
            metrics_port: parse(&get, "METRICS_PORT")?.unwrap_or(defaults.metrics_port),
        })
    }
}

fn parse<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ControllerError> {
    get(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|_| ControllerError::InvalidConfig(format!("{key}: invalid value {raw:?}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn options(vars: &[(&str, &str)]) -> Result<ControllerOptions, ControllerError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ControllerOptions::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(options(&[]).unwrap(), ControllerOptions::default());
    }

    #[test]
    fn reads_every_variable() {
        let opts = options(&[
            ("WATCH_NAMESPACE", "gitlab"),
            ("POLL_INTERVAL_SECONDS", "30"),
            ("MAX_CONCURRENT_RECONCILES", "8"),
            ("ENABLE_MANAGEMENT_POLICIES", "false"),
            ("ENABLE_CRD_GATING", "true"),
            ("PROJECT_PATH_EXTERNAL_NAMES", "true"),
            ("METRICS_PORT", "9090"),
        ])
        .unwrap();
        assert_eq!(opts.watch_namespace.as_deref(), Some("gitlab"));
        assert_eq!(opts.poll_interval, Duration::from_secs(30));
        assert_eq!(opts.max_concurrent_reconciles, 8);
        assert!(!opts.enable_management_policies);
        assert!(opts.enable_crd_gating);
        assert!(opts.project_path_external_names);
        assert_eq!(opts.metrics_port, 9090);
    }

    #[test]
    fn blank_namespace_means_all() {
        assert_eq!(options(&[("WATCH_NAMESPACE", "  ")]).unwrap().watch_namespace, None);
    }

    #[test]
    fn rejects_garbage() {
        let err = options(&[("POLL_INTERVAL_SECONDS", "soon")]).unwrap_err();
        assert!(err.to_string().contains("POLL_INTERVAL_SECONDS"));
    }
}
