use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use fl_core::{
    normalize_tags, Article, ArticleFields, ArticleFilter, ArticleId, AuthorRef, ContentService, Error, Result,
};
use tokio::sync::RwLock;

pub struct MemoryStore {
    articles: Vec<Article>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self { articles: Vec::new() }
    }

    fn find(&self, id: &ArticleId) -> Result<&Article> {
        self.articles
            .iter()
            .find(|a| &a.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    pub fn list(&self, filter: &ArticleFilter) -> Vec<Article> {
        let mut articles: Vec<Article> = self.articles.iter().filter(|a| filter.matches(a)).cloned().collect();
        articles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let limit = filter.limit.unwrap_or(u32::MAX) as usize;
        let skip = (filter.page.unwrap_or(1).saturating_sub(1) as usize).saturating_mul(limit);
        articles.into_iter().skip(skip).take(limit).collect()
    }

    pub fn similar(&self, id: &ArticleId, limit: usize) -> Result<Vec<Article>> {
        let article = self.find(id)?;
        Ok(self
            .articles
            .iter()
            .filter(|a| a.id != article.id && a.category.is_some() && a.category == article.category)
            .take(limit)
            .cloned()
            .collect())
    }

    pub fn insert(&mut self, fields: &ArticleFields, author: Option<AuthorRef>) -> Article {
        let now = Utc::now();
        let article = Article {
            id: ArticleId::new(uuid::Uuid::new_v4().to_string()),
            title: fields.title.clone(),
            content: fields.content.clone(),
            summary: Some(fields.summary.clone()).filter(|s| !s.trim().is_empty()),
            category: Some(fields.category),
            tags: normalize_tags(&fields.tags),
            author,
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.articles.push(article.clone());
        article
    }

    pub fn replace(&mut self, id: &ArticleId, fields: &ArticleFields) -> Result<Article> {
        let article = self
            .articles
            .iter_mut()
            .find(|a| &a.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        article.title = fields.title.clone();
        article.content = fields.content.clone();
        article.summary = Some(fields.summary.clone()).filter(|s| !s.trim().is_empty());
        article.category = Some(fields.category);
        article.tags = normalize_tags(&fields.tags);
        article.updated_at = Some(Utc::now().max(article.created_at.unwrap_or_default()));
        Ok(article.clone())
    }

    pub fn remove(&mut self, id: &ArticleId) -> Result<()> {
        let before = self.articles.len();
        self.articles.retain(|a| &a.id != id);
        if self.articles.len() == before {
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Article service kept entirely in process memory. Used for offline runs.
#[derive(Clone)]
pub struct MemoryContentService {
    store: Arc<RwLock<MemoryStore>>,
    author: Option<AuthorRef>,
}

impl MemoryContentService {
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(MemoryStore::new())),
            author: None,
        }
    }

    /// Articles created through this service are attributed to `author`.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(AuthorRef::Id(author.into()));
        self
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.articles.len()
    }
}

impl Default for MemoryContentService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentService for MemoryContentService {
    async fn list(&self, filter: &ArticleFilter) -> Result<Vec<Article>> {
        let store = self.store.read().await;
        Ok(store.list(filter))
    }

    async fn get(&self, id: &ArticleId) -> Result<Article> {
        let store = self.store.read().await;
        store.find(id).cloned()
    }

    async fn similar(&self, id: &ArticleId) -> Result<Vec<Article>> {
        let store = self.store.read().await;
        store.similar(id, 5)
    }

    async fn create(&self, fields: &ArticleFields) -> Result<Article> {
        let mut store = self.store.write().await;
        Ok(store.insert(fields, self.author.clone()))
    }

    async fn update(&self, id: &ArticleId, fields: &ArticleFields) -> Result<Article> {
        let mut store = self.store.write().await;
        store.replace(id, fields)
    }

    async fn delete(&self, id: &ArticleId) -> Result<()> {
        let mut store = self.store.write().await;
        store.remove(id)
    }
}
