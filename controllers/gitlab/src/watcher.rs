//! Kubernetes resource watchers.
//!
//! Every kind is driven by the same `watch_resource()` helper around
//! `kube_runtime::Controller`, which handles reconnection, per-key
//! serialization and the work queue. Failed reconciles are requeued by
//! [`requeue_after`]: conflicts almost immediately, transient failures on a
//! per-record Fibonacci backoff, everything else on the poll schedule.

use crate::backoff::BackoffRegistry;
use crate::engine::ManagedReconciler;
use crate::error::ControllerError;
use crate::metrics;
use crate::references::ResolveReferences;
use async_trait::async_trait;
use crds::Managed;
use futures::StreamExt;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::{Api, Client, Resource, ResourceExt};
use kube_runtime::controller::{Action, Config as ControllerConfig};
use kube_runtime::reflector::Store;
use kube_runtime::wait::{await_condition, conditions};
use kube_runtime::{watcher, Controller};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Delay before retrying after a write conflict
pub const CONFLICT_RETRY: Duration = Duration::from_secs(1);

/// Reconciles one object of kind `K`
#[async_trait]
pub trait Reconcile<K>: Send + Sync + 'static {
    async fn reconcile(&self, obj: &K) -> Result<Action, ControllerError>;
}

#[async_trait]
impl<K: Managed + ResolveReferences> Reconcile<K> for ManagedReconciler<K> {
    async fn reconcile(&self, obj: &K) -> Result<Action, ControllerError> {
        let mut cr = obj.clone();
        ManagedReconciler::reconcile(self, &mut cr).await
    }
}

/// Per-watcher settings
#[derive(Debug, Clone)]
pub struct WatchSettings {
    pub poll_interval: Duration,
    pub concurrency: u16,
}

struct Context<K: Resource<DynamicType = ()> + Clone + 'static, R> {
    reconciler: Arc<R>,
    backoff: BackoffRegistry,
    poll_interval: Duration,
    store: Store<K>,
}

/// Record key used for backoff bookkeeping
fn record_key<K: Resource>(obj: &K) -> String {
    format!("{}/{}", obj.namespace().unwrap_or_default(), obj.name_any())
}

/// How long to wait before retrying a failed reconcile
pub fn requeue_after(
    error: &ControllerError,
    backoff: &BackoffRegistry,
    key: &str,
    poll_interval: Duration,
) -> Duration {
    if error.is_conflict() {
        CONFLICT_RETRY
    } else if error.is_transient() {
        backoff.next_backoff(key)
    } else {
        poll_interval
    }
}

/// Wait until the CRD serving `crd_name` is established
pub async fn wait_for_crd(client: Client, crd_name: &str) -> Result<(), ControllerError> {
    info!(crd = crd_name, "waiting for CRD to be established");
    let api: Api<CustomResourceDefinition> = Api::all(client);
    await_condition(api, crd_name, conditions::is_crd_established())
        .await
        .map_err(|e| ControllerError::Watch(format!("waiting for CRD {crd_name}: {e}")))?;
    Ok(())
}

/// Run a controller for `K` until the watch stream ends
pub async fn watch_resource<K, R>(
    api: Api<K>,
    reconciler: Arc<R>,
    settings: WatchSettings,
) -> Result<(), ControllerError>
where
    K: Resource<DynamicType = ()> + Clone + Debug + DeserializeOwned + Send + Sync + 'static,
    R: Reconcile<K>,
{
    let kind = K::kind(&()).to_string();
    info!(%kind, concurrency = settings.concurrency, "starting watcher");

    let controller = Controller::new(api, watcher::Config::default()).with_config(
        ControllerConfig::default()
            .debounce(Duration::from_millis(500))
            .concurrency(settings.concurrency),
    );
    let context = Arc::new(Context {
        reconciler,
        backoff: BackoffRegistry::default(),
        poll_interval: settings.poll_interval,
        store: controller.store(),
    });

    let reconcile = |obj: Arc<K>, ctx: Arc<Context<K, R>>| async move {
        let kind = K::kind(&());
        let key = record_key(obj.as_ref());
        debug!(%kind, %key, "reconciling");
        metrics::set_managed_resources(&kind, ctx.store.state().len());

        let started = Instant::now();
        let result = ctx.reconciler.reconcile(obj.as_ref()).await;
        metrics::observe_reconciliation(&kind, started.elapsed(), result.is_ok());
        if result.is_ok() {
            ctx.backoff.reset(&key);
        }
        result
    };

    let error_policy = |obj: Arc<K>, err: &ControllerError, ctx: Arc<Context<K, R>>| {
        let key = record_key(obj.as_ref());
        let delay = requeue_after(err, &ctx.backoff, &key, ctx.poll_interval);
        warn!(
            kind = %K::kind(&()),
            %key,
            error = %err,
            retries = ctx.backoff.error_count(&key),
            delay_secs = delay.as_secs(),
            "reconcile failed"
        );
        Action::requeue(delay)
    };

    controller
        .run(reconcile, error_policy, context)
        .for_each(|res| {
            let kind = kind.clone();
            async move {
                if let Err(e) = res {
                    debug!(%kind, error = %e, "controller event");
                }
            }
        })
        .await;

    error!(%kind, "watcher stopped");
    Err(ControllerError::Watch(format!("{kind} watch stream ended")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitlab_client::GitLabError;

    fn remote(status: u16) -> ControllerError {
        ControllerError::remote(
            "update Project",
            GitLabError::Api {
                method: "PUT",
                path: "/projects/1".to_string(),
                status,
                message: "boom".to_string(),
            },
        )
    }

    const POLL: Duration = Duration::from_secs(60);

    #[test]
    fn conflicts_retry_after_one_second() {
        let backoff = BackoffRegistry::default();
        assert_eq!(requeue_after(&remote(409), &backoff, "ns/a", POLL), CONFLICT_RETRY);
        assert_eq!(backoff.error_count("ns/a"), 0);
    }

    #[test]
    fn transient_errors_back_off() {
        let backoff = BackoffRegistry::default();
        let delays: Vec<u64> = (0..4)
            .map(|_| requeue_after(&remote(503), &backoff, "ns/a", POLL).as_secs())
            .collect();
        assert_eq!(delays, vec![1, 1, 2, 3]);
        assert_eq!(requeue_after(&remote(429), &backoff, "ns/b", POLL), Duration::from_secs(1));
    }

    #[test]
    fn terminal_errors_follow_poll_interval() {
        let backoff = BackoffRegistry::default();
        assert_eq!(requeue_after(&remote(403), &backoff, "ns/a", POLL), POLL);
        assert_eq!(
            requeue_after(&ControllerError::MissingIdentifier("ProjectID"), &backoff, "ns/a", POLL),
            POLL
        );
        assert_eq!(backoff.error_count("ns/a"), 0);
    }

    #[test]
    fn keys_include_namespace() {
        let cr = crate::test_utils::project_record("demo");
        assert_eq!(record_key(&cr), "default/demo");
    }
}
