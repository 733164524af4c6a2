use async_trait::async_trait;
use fl_core::{Article, ArticleFields, ArticleFilter, ArticleId, ContentService, Result};
use reqwest::Method;
use serde::Deserialize;

use crate::http::ApiClient;

/// The list endpoint answers either with a bare array or with a wrapper.
#[derive(Deserialize)]
#[serde(untagged)]
enum ListResponse {
    Items { items: Vec<Article> },
    Articles { articles: Vec<Article> },
    Plain(Vec<Article>),
}

impl ListResponse {
    fn into_articles(self) -> Vec<Article> {
        match self {
            ListResponse::Items { items } => items,
            ListResponse::Articles { articles } => articles,
            ListResponse::Plain(articles) => articles,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpContentService {
    api: ApiClient,
}

impl HttpContentService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ContentService for HttpContentService {
    async fn list(&self, filter: &ArticleFilter) -> Result<Vec<Article>> {
        let request = self.api.request(Method::GET, &["articles"])?.query(&filter.to_query());
        let response: ListResponse = self.api.json(request).await?;
        Ok(response.into_articles())
    }

    async fn get(&self, id: &ArticleId) -> Result<Article> {
        let request = self.api.request(Method::GET, &["articles", id.as_str()])?;
        self.api.json(request).await
    }

    async fn similar(&self, id: &ArticleId) -> Result<Vec<Article>> {
        let request = self.api.request(Method::GET, &["articles", id.as_str(), "similar"])?;
        let response: ListResponse = self.api.json(request).await?;
        Ok(response.into_articles())
    }

    async fn create(&self, fields: &ArticleFields) -> Result<Article> {
        let request = self.api.request(Method::POST, &["articles"])?.json(fields);
        self.api.json(request).await
    }

    async fn update(&self, id: &ArticleId, fields: &ArticleFields) -> Result<Article> {
        let request = self.api.request(Method::PUT, &["articles", id.as_str()])?.json(fields);
        self.api.json(request).await
    }

    async fn delete(&self, id: &ArticleId) -> Result<()> {
        let request = self.api.request(Method::DELETE, &["articles", id.as_str()])?;
        self.api.send(request).await?;
        Ok(())
    }
}
