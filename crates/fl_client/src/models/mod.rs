use std::str::FromStr;
use std::sync::Arc;

use fl_core::{EnrichmentService, Error, Result};

use crate::http::ApiClient;

pub mod dummy;
pub mod remote;

pub use dummy::DummyEnrichment;
pub use remote::RemoteEnrichment;

/// Which enrichment implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnrichmentBackend {
    #[default]
    Remote,
    Dummy,
}

impl FromStr for EnrichmentBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "remote" | "api" => Ok(EnrichmentBackend::Remote),
            "dummy" | "offline" => Ok(EnrichmentBackend::Dummy),
            other => Err(Error::Validation(format!(
                "Unknown enrichment backend: {}. Available: remote, dummy",
                other
            ))),
        }
    }
}

pub fn create_enrichment(backend: EnrichmentBackend, api: &ApiClient) -> Arc<dyn EnrichmentService> {
    let model: Arc<dyn EnrichmentService> = match backend {
        EnrichmentBackend::Remote => Arc::new(RemoteEnrichment::new(api.clone())),
        EnrichmentBackend::Dummy => Arc::new(DummyEnrichment::new()),
    };
    tracing::debug!("Using {} enrichment", model.name());
    model
}
