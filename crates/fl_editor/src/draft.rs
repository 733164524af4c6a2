use fl_core::{normalize_tags, Article, ArticleFields, Category, SUMMARY_MAX_CHARS};

use crate::error::ValidationError;

/// Local, editable copy of an article plus UI-only fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftState {
    pub title: String,
    pub content: String,
    pub summary: String,
    pub category: Option<Category>,
    /// Comma-delimited, as typed.
    pub tags: String,
    /// Instruction for the custom-prompt transform. Never persisted.
    pub prompt: String,
}

impl DraftState {
    pub fn from_article(article: &Article) -> Self {
        Self {
            title: article.title.clone(),
            content: article.content.clone(),
            summary: article.summary.clone().unwrap_or_default(),
            category: article.category,
            tags: article.tags_string(),
            prompt: String::new(),
        }
    }

    pub fn display_tags(&self) -> Vec<String> {
        normalize_tags(&self.tags)
    }

    /// The payload to persist, or the first reason it cannot be sent.
    pub fn validate(&self) -> Result<ArticleFields, ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        if self.content.trim().is_empty() {
            return Err(ValidationError::MissingContent);
        }
        let category = self.category.ok_or(ValidationError::MissingCategory)?;
        let len = self.summary.trim().chars().count();
        if len > SUMMARY_MAX_CHARS {
            return Err(ValidationError::SummaryTooLong {
                len,
                max: SUMMARY_MAX_CHARS,
            });
        }
        Ok(ArticleFields {
            title: self.title.trim().to_string(),
            content: self.content.clone(),
            summary: self.summary.trim().to_string(),
            category,
            tags: self.display_tags().join(", "),
        })
    }
}
