use async_trait::async_trait;
use crate::Result;

/// AI-backed transformations of article text.
#[async_trait]
pub trait EnrichmentService: Send + Sync {
    fn name(&self) -> &str;

    /// Generate a summary for a piece of content
    async fn summarize(&self, text: &str) -> Result<String>;

    /// Return a revised version of the content
    async fn improve(&self, text: &str) -> Result<String>;

    /// Rewrite the content following a free-form instruction
    async fn apply_prompt(&self, text: &str, instruction: &str) -> Result<String>;
}
