use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::EditorError;

/// Allows a single enrichment call at a time. Held for the duration of the
/// request; released when the permit is dropped.
#[derive(Debug, Clone)]
pub struct EnrichmentGate {
    permits: Arc<Semaphore>,
}

#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
}

impl EnrichmentGate {
    pub fn new() -> Self {
        Self {
            permits: Arc::new(Semaphore::new(1)),
        }
    }

    /// Take the gate or fail immediately. Callers are rejected, not queued.
    pub fn try_enter(&self) -> Result<GatePermit, EditorError> {
        self.permits
            .clone()
            .try_acquire_owned()
            .map(|permit| GatePermit { _permit: permit })
            .map_err(|_| EditorError::EnrichmentInFlight)
    }

    /// Wait for the gate.
    pub async fn enter(&self) -> Result<GatePermit, EditorError> {
        self.permits
            .clone()
            .acquire_owned()
            .await
            .map(|permit| GatePermit { _permit: permit })
            .map_err(|_| EditorError::EnrichmentInFlight)
    }

    pub fn is_busy(&self) -> bool {
        self.permits.available_permits() == 0
    }
}

impl Default for EnrichmentGate {
    fn default() -> Self {
        Self::new()
    }
}
