//! GitLab Controller
//!
//! Reconciles GitLab resources declared as Kubernetes records:
//! - Project, Hook, Variable, Member, DeployToken, AccessToken,
//!   ApprovalRule, ProtectedBranch, PipelineSchedule
//! - Group, SamlGroupLink, LdapGroupLink
//! - Runner
//!
//! GitLab credentials come from `ProviderConfig` / `ClusterProviderConfig`
//! records; process settings come from the environment (see `options`).

mod backoff;
mod collection;
mod config;
mod connector;
mod controller;
mod engine;
mod error;
mod external;
mod metrics;
mod options;
mod reconcile_helpers;
mod reconciler;
mod references;
mod secrets;
mod server;
mod store;
mod usage;
mod watcher;

#[cfg(test)]
mod test_utils;

use anyhow::{anyhow, Context, Result};
use controller::Controller;
use options::ControllerOptions;
use server::ServerState;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("failed to install rustls crypto provider"))?;

    info!("Starting GitLab Controller");

    let options = ControllerOptions::from_env().context("invalid controller configuration")?;
    info!(
        namespace = options.watch_namespace.as_deref().unwrap_or("all namespaces"),
        poll_interval_secs = options.poll_interval.as_secs(),
        concurrency = options.max_concurrent_reconciles,
        management_policies = options.enable_management_policies,
        crd_gating = options.enable_crd_gating,
        "configuration loaded"
    );

    metrics::register_metrics()?;
    let state = Arc::new(ServerState::default());
    let port = options.metrics_port;
    let server_state = Arc::clone(&state);
    tokio::spawn(async move {
        if let Err(e) = server::start_server(port, server_state).await {
            error!(error = %e, "HTTP server failed");
        }
    });

    let controller = Controller::new(options).await?;
    state.set_ready(true);
    controller.run().await?;
    Ok(())
}
