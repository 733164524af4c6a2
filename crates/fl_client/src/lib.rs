use std::sync::Arc;
use std::time::Duration;

use fl_core::{AuthService, ContentService, EnrichmentService, Result, TokenStore};
use url::Url;

pub mod auth;
pub mod backends;
pub mod content;
pub mod http;
pub mod models;

pub use auth::HttpAuthService;
pub use backends::MemoryContentService;
pub use content::HttpContentService;
pub use http::ApiClient;
pub use models::{create_enrichment, DummyEnrichment, EnrichmentBackend, RemoteEnrichment};

pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: Url,
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url.trim())?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// The set of collaborators the editor and list views are built from.
#[derive(Clone)]
pub struct Services {
    pub content: Arc<dyn ContentService>,
    pub enrichment: Arc<dyn EnrichmentService>,
    pub auth: Option<Arc<dyn AuthService>>,
}

impl Services {
    /// Services backed by the REST API.
    pub fn remote(config: &ApiConfig, tokens: TokenStore, enrichment: EnrichmentBackend) -> Result<Self> {
        let api = ApiClient::new(config, tokens)?;
        Ok(Self {
            content: Arc::new(HttpContentService::new(api.clone())),
            enrichment: create_enrichment(enrichment, &api),
            auth: Some(Arc::new(HttpAuthService::new(api))),
        })
    }

    /// In-process services; nothing leaves the machine.
    pub fn offline() -> Self {
        Self {
            content: Arc::new(MemoryContentService::new().with_author("offline")),
            enrichment: Arc::new(DummyEnrichment::new()),
            auth: None,
        }
    }
}
