use async_trait::async_trait;
use crate::types::{Article, ArticleFields, ArticleFilter, ArticleId};
use crate::Result;

/// Request wrapper over the article endpoints. Every call is exactly one
/// request; nothing is retried or cached.
#[async_trait]
pub trait ContentService: Send + Sync {
    /// List articles matching a filter
    async fn list(&self, filter: &ArticleFilter) -> Result<Vec<Article>>;

    /// Fetch a single article
    async fn get(&self, id: &ArticleId) -> Result<Article>;

    /// Articles the server considers similar to `id`
    async fn similar(&self, id: &ArticleId) -> Result<Vec<Article>>;

    /// Create an article. Not idempotent: each call allocates a new id.
    async fn create(&self, fields: &ArticleFields) -> Result<Article>;

    /// Replace the editable fields of an existing article
    async fn update(&self, id: &ArticleId, fields: &ArticleFields) -> Result<Article>;

    /// Delete an article
    async fn delete(&self, id: &ArticleId) -> Result<()>;
}
