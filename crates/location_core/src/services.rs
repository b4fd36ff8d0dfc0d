//! Boundaries to the platform collaborators the orchestrator drives:
//! permissions, positioning, reverse geocoding.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::broadcast;

use shared::{
    domain::{AddressCandidate, Coordinate, PermissionStatus, PositionFix},
    error::{AddressError, AddressErrorKind, PositionError, PositionErrorKind},
};

/// Options for a position request. The accuracy value is a hint; sources
/// may deliver coarser readings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionRequestOptions {
    pub desired_accuracy_m: f64,
}

impl Default for PositionRequestOptions {
    fn default() -> Self {
        Self {
            desired_accuracy_m: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PositionEvent {
    /// A batch of readings, oldest first.
    Batch(Vec<PositionFix>),
    Failed(PositionError),
}

#[async_trait]
pub trait PermissionService: Send + Sync {
    /// Current authorization state. Cheap synchronous query.
    fn authorization_status(&self) -> PermissionStatus;

    /// Initiates the out-of-band permission prompt. The outcome is observed
    /// through a later `authorization_status` query, not a callback.
    async fn request_authorization(&self) -> Result<()>;
}

/// An active position request. Dropping the subscription does not stop the
/// underlying source; call `stop`.
pub trait PositionSubscription: Send + Sync {
    fn subscribe(&self) -> broadcast::Receiver<PositionEvent>;
    fn stop(&self);
}

#[async_trait]
pub trait PositionService: Send + Sync {
    async fn start(
        &self,
        options: PositionRequestOptions,
    ) -> std::result::Result<Arc<dyn PositionSubscription>, PositionError>;
}

#[async_trait]
pub trait GeocodingService: Send + Sync {
    /// Resolves a coordinate into candidate postal addresses. Resolves
    /// exactly once per call; an empty list means the location has no
    /// known address.
    async fn reverse_resolve(
        &self,
        coordinate: Coordinate,
    ) -> std::result::Result<Vec<AddressCandidate>, AddressError>;
}

pub struct MissingPermissionService;

#[async_trait]
impl PermissionService for MissingPermissionService {
    fn authorization_status(&self) -> PermissionStatus {
        PermissionStatus::Restricted
    }

    async fn request_authorization(&self) -> Result<()> {
        Err(anyhow!("permission backend unavailable"))
    }
}

pub struct MissingPositionService;

#[async_trait]
impl PositionService for MissingPositionService {
    async fn start(
        &self,
        _options: PositionRequestOptions,
    ) -> std::result::Result<Arc<dyn PositionSubscription>, PositionError> {
        Err(PositionError::new(
            PositionErrorKind::ServicesDisabled,
            "position backend unavailable",
        ))
    }
}

pub struct MissingGeocodingService;

#[async_trait]
impl GeocodingService for MissingGeocodingService {
    async fn reverse_resolve(
        &self,
        _coordinate: Coordinate,
    ) -> std::result::Result<Vec<AddressCandidate>, AddressError> {
        Err(AddressError::new(
            AddressErrorKind::Internal,
            "geocoding backend unavailable",
        ))
    }
}
