//! The seam between the reconciliation engine and GitLab.
//!
//! Each kind provides an `ExternalClient` that knows how to observe, create,
//! update and delete its remote object, and a `Connector` that builds one
//! from the record's provider config.

use crate::error::ControllerError;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Values published to the record's connection secret
pub type ConnectionDetails = BTreeMap<String, Vec<u8>>;

/// Result of observing the remote object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExternalObservation {
    /// The remote object exists
    pub resource_exists: bool,
    /// The remote object matches the spec
    pub resource_up_to_date: bool,
    /// Observe filled unset spec fields from the remote object
    pub resource_late_initialized: bool,
    /// Connection details derivable on every observe
    pub connection_details: ConnectionDetails,
}

impl ExternalObservation {
    /// Nothing exists remotely
    pub fn absent() -> Self {
        Self::default()
    }
}

/// Result of creating the remote object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExternalCreation {
    /// Connection details only available at creation (generated tokens)
    pub connection_details: ConnectionDetails,
}

/// Result of updating the remote object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExternalUpdate {
    pub connection_details: ConnectionDetails,
}

/// Single-entry connection details
pub fn connection_detail(key: &str, value: impl Into<Vec<u8>>) -> ConnectionDetails {
    ConnectionDetails::from([(key.to_string(), value.into())])
}

/// Operations on the remote object behind a record of kind `K`
///
/// Implementations may mutate the record: external-name after create,
/// `atProvider` and conditions during observe, late-initialized spec fields.
#[async_trait]
pub trait ExternalClient<K: Send + Sync>: Send + Sync {
    async fn observe(&self, cr: &mut K) -> Result<ExternalObservation, ControllerError>;

    async fn create(&self, cr: &mut K) -> Result<ExternalCreation, ControllerError>;

    async fn update(&self, cr: &mut K) -> Result<ExternalUpdate, ControllerError>;

    async fn delete(&self, cr: &mut K) -> Result<(), ControllerError>;

    /// Release anything held for this reconcile
    async fn disconnect(&self) -> Result<(), ControllerError> {
        Ok(())
    }
}

/// Builds an `ExternalClient` for one reconcile
#[async_trait]
pub trait Connector<K: Send + Sync>: Send + Sync {
    async fn connect(&self, cr: &K) -> Result<Box<dyn ExternalClient<K>>, ControllerError>;
}
