//! Managed reconciliation engine
//!
//! Drives one record through Connect → Observe → Create/Update/Delete and
//! writes the outcome back through the `RecordStore`:
//!
//! 1. Add the managed finalizer unless the record is being deleted.
//! 2. Resolve references; persist the spec if an ID field changed.
//! 3. Connect and observe.
//! 4. Pick a step with [`plan`] and run it.
//! 5. Persist late-initialized spec and the external-name, publish
//!    connection details, and set `Synced`.
//!
//! Failures set `Synced=False` with the error message and are returned so
//! the watcher's error policy decides when to retry.

use crate::error::ControllerError;
use crate::external::{Connector, ExternalClient, ExternalObservation};
use crate::metrics;
use crate::references::{ReferenceLookup, ResolveReferences};
use crate::store::RecordStore;
use crds::{Condition, DeletionPolicy, Managed, ManagementAction, ResourceSpec};
use kube::{Resource, ResourceExt};
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Engine timing and policy switches
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Requeue after a successful reconcile
    pub poll_interval: Duration,
    /// Requeue after create or delete, to confirm the result
    pub short_wait: Duration,
    /// When false, every record is treated as `managementPolicies: ["*"]`
    pub management_policies_enabled: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            short_wait: Duration::from_secs(5),
            management_policies_enabled: true,
        }
    }
}

/// What the engine does after observing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Nothing left to clean up remotely; release the record
    RemoveFinalizer,
    Delete,
    Create,
    Update,
    /// Remote object matches the spec
    UpToDate,
    /// Remote object is missing and Create is not allowed
    MissingNotCreatable,
}

fn allows(spec: &ResourceSpec, action: ManagementAction, policies_enabled: bool) -> bool {
    !policies_enabled || spec.allows(action)
}

/// Whether a deleting record is released without touching GitLab
pub fn orphans(spec: &ResourceSpec, policies_enabled: bool) -> bool {
    spec.deletion_policy == DeletionPolicy::Orphan
        || !allows(spec, ManagementAction::Delete, policies_enabled)
}

/// Decide the next step from the observation
pub fn plan(
    deleting: bool,
    observation: &ExternalObservation,
    spec: &ResourceSpec,
    policies_enabled: bool,
) -> Step {
    if deleting {
        if orphans(spec, policies_enabled) || !observation.resource_exists {
            return Step::RemoveFinalizer;
        }
        return Step::Delete;
    }
    if !observation.resource_exists {
        return if allows(spec, ManagementAction::Create, policies_enabled) {
            Step::Create
        } else {
            Step::MissingNotCreatable
        };
    }
    if !observation.resource_up_to_date && allows(spec, ManagementAction::Update, policies_enabled) {
        return Step::Update;
    }
    Step::UpToDate
}

/// Reconciler for managed records of kind `K`
pub struct ManagedReconciler<K: Managed> {
    connector: Arc<dyn Connector<K>>,
    store: Arc<dyn RecordStore<K>>,
    references: Arc<dyn ReferenceLookup>,
    settings: EngineSettings,
}

impl<K: Managed + ResolveReferences> ManagedReconciler<K> {
    pub fn new(
        connector: Arc<dyn Connector<K>>,
        store: Arc<dyn RecordStore<K>>,
        references: Arc<dyn ReferenceLookup>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            connector,
            store,
            references,
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Reconcile one record; `cr` reflects every write made
    pub async fn reconcile(&self, cr: &mut K) -> Result<Action, ControllerError> {
        let kind = K::kind(&());
        let name = cr.name_any();

        if cr.is_paused() {
            debug!(%kind, %name, "reconciliation paused");
            cr.set_conditions([Condition::reconcile_paused()]);
            self.store.update_status(cr).await?;
            return Ok(Action::await_change());
        }

        let deleting = cr.is_deleting();
        if deleting && orphans(cr.resource_spec(), self.settings.management_policies_enabled) {
            info!(%kind, %name, "releasing record without deleting the GitLab object");
            self.store.remove_finalizer(cr).await?;
            return Ok(Action::await_change());
        }

        if !deleting {
            self.store.add_finalizer(cr).await?;
            match cr.resolve_references(self.references.as_ref()).await {
                Ok(true) => self.store.update_record(cr).await?,
                Ok(false) => {}
                Err(e) => return self.fail(cr, e).await,
            }
        }

        let external = match self.connector.connect(cr).await {
            Ok(external) => external,
            Err(e) => return self.fail(cr, e).await,
        };
        let result = self.drive(cr, external.as_ref()).await;
        if let Err(e) = external.disconnect().await {
            warn!(%kind, %name, error = %e, "disconnect failed");
        }
        match result {
            Ok(action) => Ok(action),
            Err(e) => self.fail(cr, e).await,
        }
    }

    async fn drive(&self, cr: &mut K, external: &dyn ExternalClient<K>) -> Result<Action, ControllerError> {
        let kind = K::kind(&());
        let name = cr.name_any();
        let policies_enabled = self.settings.management_policies_enabled;

        let before = cr.external_name().to_string();
        let observation = external.observe(cr).await;
        metrics::record_external_operation(&kind, "observe", observation.is_ok());
        let observation = observation?;

        let deleting = cr.is_deleting();
        let spec = cr.resource_spec().clone();
        let step = plan(deleting, &observation, &spec, policies_enabled);
        debug!(
            %kind,
            %name,
            exists = observation.resource_exists,
            up_to_date = observation.resource_up_to_date,
            ?step,
            "observed"
        );

        if observation.resource_exists && !deleting {
            let late_init = observation.resource_late_initialized
                && allows(&spec, ManagementAction::LateInitialize, policies_enabled);
            let renamed = cr.external_name() != before;
            if late_init || renamed {
                self.store.update_record(cr).await?;
            }
        }

        match step {
            Step::RemoveFinalizer => {
                info!(%kind, %name, "GitLab object is gone, removing finalizer");
                self.store.remove_finalizer(cr).await?;
                Ok(Action::await_change())
            }
            Step::Delete => {
                info!(%kind, %name, external_name = %cr.external_name(), "deleting GitLab object");
                cr.set_conditions([Condition::deleting()]);
                let deleted = external.delete(cr).await;
                metrics::record_external_operation(&kind, "delete", deleted.is_ok());
                deleted?;
                self.succeed(cr).await?;
                Ok(Action::requeue(self.settings.short_wait))
            }
            Step::Create => {
                let before = cr.external_name().to_string();
                cr.set_conditions([Condition::creating()]);
                let created = external.create(cr).await;
                metrics::record_external_operation(&kind, "create", created.is_ok());
                // The external-name must survive even a partially failed create
                if cr.external_name() != before {
                    self.store.update_record(cr).await?;
                }
                let created = created?;
                info!(%kind, %name, external_name = %cr.external_name(), "created GitLab object");
                self.store
                    .publish_connection_details(cr, &created.connection_details)
                    .await?;
                self.succeed(cr).await?;
                Ok(Action::requeue(self.settings.short_wait))
            }
            Step::Update => {
                let updated = external.update(cr).await;
                metrics::record_external_operation(&kind, "update", updated.is_ok());
                let updated = updated?;
                info!(%kind, %name, external_name = %cr.external_name(), "updated GitLab object");
                // Details returned by the update win over observed ones
                let mut details = observation.connection_details;
                details.extend(updated.connection_details);
                self.store.publish_connection_details(cr, &details).await?;
                self.succeed(cr).await?;
                Ok(Action::requeue(self.settings.poll_interval))
            }
            Step::MissingNotCreatable => {
                cr.set_conditions([Condition::reconcile_error("external resource does not exist")]);
                self.store.update_status(cr).await?;
                Ok(Action::requeue(self.settings.poll_interval))
            }
            Step::UpToDate => {
                self.store
                    .publish_connection_details(cr, &observation.connection_details)
                    .await?;
                self.succeed(cr).await?;
                Ok(Action::requeue(self.settings.poll_interval))
            }
        }
    }

    async fn succeed(&self, cr: &mut K) -> Result<(), ControllerError> {
        cr.set_conditions([Condition::reconcile_success()]);
        self.store.update_status(cr).await
    }

    async fn fail(&self, cr: &mut K, err: ControllerError) -> Result<Action, ControllerError> {
        cr.set_conditions([Condition::reconcile_error(&err)]);
        if let Err(status_err) = self.store.update_status(cr).await {
            warn!(
                kind = %K::kind(&()),
                name = %cr.name_any(),
                error = %status_err,
                "cannot record reconcile error in status"
            );
        }
        Err(err)
    }
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;
