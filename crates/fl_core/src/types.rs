use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Longest summary the API accepts, in characters.
pub const SUMMARY_MAX_CHARS: usize = 1000;

/// Server-assigned article identifier. Opaque to the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleId(String);

impl ArticleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ArticleId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ArticleId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Technology,
    Science,
    Business,
    Health,
    Education,
    Lifestyle,
    Culture,
    Other,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Technology,
        Category::Science,
        Category::Business,
        Category::Health,
        Category::Education,
        Category::Lifestyle,
        Category::Culture,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Technology => "technology",
            Category::Science => "science",
            Category::Business => "business",
            Category::Health => "health",
            Category::Education => "education",
            Category::Lifestyle => "lifestyle",
            Category::Culture => "culture",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = crate::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| crate::Error::Validation(format!("Unknown category: {}", s)))
    }
}

/// The author as the API returns it: either a bare id or an embedded profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged, try_from = "RawAuthor")]
pub enum AuthorRef {
    Id(String),
    Profile { id: String, name: Option<String> },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAuthor {
    Id(String),
    Profile {
        #[serde(default)]
        id: Option<String>,
        #[serde(default, rename = "_id")]
        mongo_id: Option<String>,
        #[serde(default)]
        name: Option<String>,
    },
}

impl TryFrom<RawAuthor> for AuthorRef {
    type Error = String;

    fn try_from(raw: RawAuthor) -> std::result::Result<Self, Self::Error> {
        match raw {
            RawAuthor::Id(id) => Ok(AuthorRef::Id(id)),
            RawAuthor::Profile { id, mongo_id, name } => Ok(AuthorRef::Profile {
                id: pick_id(id, mongo_id, "author")?,
                name,
            }),
        }
    }
}

/// Documents may carry `id`, `_id` or both; `id` wins when both are set.
pub(crate) fn pick_id<T>(id: Option<T>, mongo_id: Option<T>, what: &str) -> std::result::Result<T, String> {
    id.or(mongo_id).ok_or_else(|| format!("{} has neither `id` nor `_id`", what))
}

impl AuthorRef {
    pub fn id(&self) -> &str {
        match self {
            AuthorRef::Id(id) => id,
            AuthorRef::Profile { id, .. } => id,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            AuthorRef::Profile { name: Some(name), .. } => name,
            _ => self.id(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawArticle")]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub content: String,
    pub summary: Option<String>,
    pub category: Option<Category>,
    pub tags: Vec<String>,
    pub author: Option<AuthorRef>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Wire shape of an article, before the two id keys are merged.
#[derive(Deserialize)]
struct RawArticle {
    #[serde(default)]
    id: Option<ArticleId>,
    #[serde(default, rename = "_id")]
    mongo_id: Option<ArticleId>,
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default, deserialize_with = "deserialize_non_empty")]
    summary: Option<String>,
    #[serde(default, deserialize_with = "deserialize_category")]
    category: Option<Category>,
    #[serde(default, deserialize_with = "deserialize_tags")]
    tags: Vec<String>,
    #[serde(default)]
    author: Option<AuthorRef>,
    #[serde(default, rename = "createdAt", alias = "created_at")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "updatedAt", alias = "updated_at")]
    updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<RawArticle> for Article {
    type Error = String;

    fn try_from(raw: RawArticle) -> std::result::Result<Self, Self::Error> {
        Ok(Article {
            id: pick_id(raw.id, raw.mongo_id, "article")?,
            title: raw.title,
            content: raw.content,
            summary: raw.summary,
            category: raw.category,
            tags: raw.tags,
            author: raw.author,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
        })
    }
}

impl Article {
    /// True when the article was modified after creation. Equal timestamps
    /// mean it was never edited.
    pub fn was_updated(&self) -> bool {
        match (self.created_at, self.updated_at) {
            (Some(created), Some(updated)) => updated > created,
            _ => false,
        }
    }

    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }

    pub fn tags_string(&self) -> String {
        self.tags.join(", ")
    }
}

/// Body of `POST /articles` and `PUT /articles/:id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleFields {
    pub title: String,
    pub content: String,
    pub summary: String,
    pub category: Category,
    pub tags: String,
}

impl ArticleFields {
    /// Same fields with `summary` replaced; used to patch a generated summary
    /// onto an article that was just saved.
    pub fn with_summary(&self, summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            ..self.clone()
        }
    }
}

/// Query for `GET /articles`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleFilter {
    pub search: Option<String>,
    pub category: Option<Category>,
    pub author: Option<String>,
    pub limit: Option<u32>,
    pub page: Option<u32>,
}

impl ArticleFilter {
    pub fn page(page: u32, limit: u32) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
            ..Default::default()
        }
    }

    /// Query-string pairs, with empty values left out.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query.push(("search", search.to_string()));
        }
        if let Some(category) = self.category {
            query.push(("category", category.to_string()));
        }
        if let Some(author) = self.author.as_deref().filter(|s| !s.is_empty()) {
            query.push(("author", author.to_string()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(page) = self.page {
            query.push(("page", page.to_string()));
        }
        query
    }

    pub fn matches(&self, article: &Article) -> bool {
        if let Some(category) = self.category {
            if article.category != Some(category) {
                return false;
            }
        }
        if let Some(author) = self.author.as_deref().filter(|s| !s.is_empty()) {
            if article.author.as_ref().map(AuthorRef::id) != Some(author) {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(search) => {
                let needle = search.to_lowercase();
                article.title.to_lowercase().contains(&needle)
                    || article.content.to_lowercase().contains(&needle)
                    || article.tags.iter().any(|t| t.to_lowercase() == needle)
            }
            None => true,
        }
    }
}

/// Free-text query plus optional category, as typed into a list view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCriteria {
    pub query: String,
    pub category: Option<Category>,
}

impl SearchCriteria {
    pub fn new(query: impl Into<String>, category: Option<Category>) -> Self {
        Self {
            query: query.into(),
            category,
        }
    }
}

impl From<&SearchCriteria> for ArticleFilter {
    fn from(criteria: &SearchCriteria) -> Self {
        let query = criteria.query.trim();
        Self {
            search: (!query.is_empty()).then(|| query.to_string()),
            category: criteria.category,
            ..Default::default()
        }
    }
}

/// Splits a comma-delimited tag string into trimmed, non-empty tags, keeping
/// the first occurrence of each.
pub fn normalize_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

/// Cuts `summary` down to `SUMMARY_MAX_CHARS` characters.
pub fn truncate_summary(summary: &str) -> String {
    let summary = summary.trim();
    match summary.char_indices().nth(SUMMARY_MAX_CHARS) {
        Some((idx, _)) => summary[..idx].to_string(),
        None => summary.to_string(),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTags {
    Text(String),
    List(Vec<String>),
}

fn deserialize_tags<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RawTags>::deserialize(deserializer)? {
        Some(RawTags::Text(text)) => normalize_tags(&text),
        Some(RawTags::List(list)) => normalize_tags(&list.join(",")),
        None => Vec::new(),
    })
}

fn deserialize_non_empty<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.trim().is_empty()))
}

fn deserialize_category<'de, D>(deserializer: D) -> std::result::Result<Option<Category>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| match s.parse() {
        Ok(category) => Some(category),
        Err(_) => {
            tracing::debug!("Ignoring unknown category: {}", s);
            None
        }
    }))
}
