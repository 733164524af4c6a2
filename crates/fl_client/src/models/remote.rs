use async_trait::async_trait;
use fl_core::{EnrichmentService, Result};
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::http::ApiClient;

#[derive(Serialize)]
struct TextRequest<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct PromptRequest<'a> {
    text: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct SummaryResponse {
    summary: String,
}

#[derive(Deserialize)]
struct ImproveResponse {
    improved: String,
}

#[derive(Deserialize)]
struct PromptResponse {
    modified: String,
}

/// Enrichment through the API's `/ai/*` endpoints.
#[derive(Debug, Clone)]
pub struct RemoteEnrichment {
    api: ApiClient,
}

impl RemoteEnrichment {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl EnrichmentService for RemoteEnrichment {
    fn name(&self) -> &str {
        "Remote"
    }

    async fn summarize(&self, text: &str) -> Result<String> {
        let request = self
            .api
            .request(Method::POST, &["ai", "summary"])?
            .json(&TextRequest { text });
        let response: SummaryResponse = self.api.json(request).await?;
        tracing::debug!("Generated summary: {}", response.summary);
        Ok(response.summary)
    }

    async fn improve(&self, text: &str) -> Result<String> {
        let request = self
            .api
            .request(Method::POST, &["ai", "improve"])?
            .json(&TextRequest { text });
        let response: ImproveResponse = self.api.json(request).await?;
        Ok(response.improved)
    }

    async fn apply_prompt(&self, text: &str, instruction: &str) -> Result<String> {
        let request = self
            .api
            .request(Method::POST, &["ai", "apply-prompt"])?
            .json(&PromptRequest { text, prompt: instruction });
        let response: PromptResponse = self.api.json(request).await?;
        Ok(response.modified)
    }
}
