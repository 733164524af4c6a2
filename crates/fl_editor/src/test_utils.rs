//! Scripted service doubles for orchestrator tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use fl_core::{
    normalize_tags, Article, ArticleFields, ArticleFilter, ArticleId, Category, ContentService, EnrichmentService,
    Error, Result,
};
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    List,
    Get,
    Create,
    Update,
    Delete,
    Summarize,
    Improve,
    ApplyPrompt,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List(ArticleFilter, Instant),
    Get(ArticleId),
    Similar(ArticleId),
    Create(ArticleFields),
    Update(ArticleId, ArticleFields),
    Delete(ArticleId),
    Summarize(String),
    Improve(String),
    ApplyPrompt(String, String),
}

impl Call {
    pub fn op(&self) -> Option<Op> {
        match self {
            Call::List(..) => Some(Op::List),
            Call::Get(_) => Some(Op::Get),
            Call::Similar(_) => None,
            Call::Create(_) => Some(Op::Create),
            Call::Update(..) => Some(Op::Update),
            Call::Delete(_) => Some(Op::Delete),
            Call::Summarize(_) => Some(Op::Summarize),
            Call::Improve(_) => Some(Op::Improve),
            Call::ApplyPrompt(..) => Some(Op::ApplyPrompt),
        }
    }
}

pub fn article(id: &str, title: &str) -> Article {
    let created = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
    Article {
        id: ArticleId::from(id),
        title: title.to_string(),
        content: format!("<p>{} body</p>", title),
        summary: None,
        category: Some(Category::Technology),
        tags: vec!["demo".to_string()],
        author: None,
        created_at: Some(created),
        updated_at: Some(created),
    }
}

fn scripted_failure(message: Option<&String>) -> Error {
    Error::Api {
        status: 500,
        message: message.cloned(),
    }
}

/// Records every call and answers from an in-memory list. Failures and
/// latency are scripted per operation.
#[derive(Default)]
pub struct Script {
    calls: Mutex<Vec<Call>>,
    failures: Mutex<HashMap<Op, Option<String>>>,
    delays: Mutex<HashMap<Op, Duration>>,
    query_delays: Mutex<HashMap<String, Duration>>,
    failing_ids: Mutex<HashSet<ArticleId>>,
    failing_queries: Mutex<HashSet<String>>,
}

impl Script {
    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, op: Op) -> usize {
        self.calls().iter().filter(|c| c.op() == Some(op)).count()
    }

    /// Every call of `op` fails with a 500, carrying `message` if given.
    pub fn fail(&self, op: Op, message: Option<&str>) {
        self.failures.lock().unwrap().insert(op, message.map(str::to_string));
    }

    pub fn delay(&self, op: Op, delay: Duration) {
        self.delays.lock().unwrap().insert(op, delay);
    }

    pub fn delay_query(&self, query: &str, delay: Duration) {
        self.query_delays.lock().unwrap().insert(query.to_string(), delay);
    }

    pub fn fail_query(&self, query: &str) {
        self.failing_queries.lock().unwrap().insert(query.to_string());
    }

    pub fn fail_delete_of(&self, id: &str) {
        self.failing_ids.lock().unwrap().insert(ArticleId::from(id));
    }

    async fn latency(&self, op: Op) {
        let delay = self.delays.lock().unwrap().get(&op).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn outcome(&self, op: Op) -> Result<()> {
        match self.failures.lock().unwrap().get(&op) {
            Some(message) => Err(scripted_failure(message.as_ref())),
            None => Ok(()),
        }
    }
}

pub struct ScriptedContent {
    pub script: Script,
    articles: Mutex<Vec<Article>>,
    next_id: AtomicU64,
}

impl ScriptedContent {
    pub fn new(articles: Vec<Article>) -> Self {
        Self {
            script: Script::default(),
            articles: Mutex::new(articles),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn stored(&self, id: &str) -> Option<Article> {
        self.articles.lock().unwrap().iter().find(|a| a.id.as_str() == id).cloned()
    }

    fn build(id: ArticleId, fields: &ArticleFields) -> Article {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        Article {
            id,
            title: fields.title.clone(),
            content: fields.content.clone(),
            summary: Some(fields.summary.clone()).filter(|s| !s.is_empty()),
            category: Some(fields.category),
            tags: normalize_tags(&fields.tags),
            author: None,
            created_at: Some(created),
            updated_at: Some(created),
        }
    }
}

#[async_trait]
impl ContentService for ScriptedContent {
    async fn list(&self, filter: &ArticleFilter) -> Result<Vec<Article>> {
        self.script.record(Call::List(filter.clone(), Instant::now()));
        let query = filter.search.clone().unwrap_or_default();
        let delay = self.script.query_delays.lock().unwrap().get(&query).copied();
        match delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => self.script.latency(Op::List).await,
        }
        self.script.outcome(Op::List)?;
        if self.script.failing_queries.lock().unwrap().contains(&query) {
            return Err(scripted_failure(None));
        }
        let articles = self.articles.lock().unwrap();
        Ok(articles.iter().filter(|a| filter.matches(a)).cloned().collect())
    }

    async fn get(&self, id: &ArticleId) -> Result<Article> {
        self.script.record(Call::Get(id.clone()));
        self.script.latency(Op::Get).await;
        self.script.outcome(Op::Get)?;
        self.stored(id.as_str()).ok_or_else(|| Error::NotFound(id.to_string()))
    }

    async fn similar(&self, id: &ArticleId) -> Result<Vec<Article>> {
        self.script.record(Call::Similar(id.clone()));
        Ok(Vec::new())
    }

    async fn create(&self, fields: &ArticleFields) -> Result<Article> {
        self.script.record(Call::Create(fields.clone()));
        self.script.latency(Op::Create).await;
        self.script.outcome(Op::Create)?;
        let id = format!("new-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let article = Self::build(ArticleId::new(id), fields);
        self.articles.lock().unwrap().push(article.clone());
        Ok(article)
    }

    async fn update(&self, id: &ArticleId, fields: &ArticleFields) -> Result<Article> {
        self.script.record(Call::Update(id.clone(), fields.clone()));
        self.script.latency(Op::Update).await;
        self.script.outcome(Op::Update)?;
        let mut articles = self.articles.lock().unwrap();
        let existing = articles
            .iter_mut()
            .find(|a| &a.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        let mut updated = Self::build(id.clone(), fields);
        updated.updated_at = updated.created_at.map(|t| t + chrono::Duration::minutes(5));
        *existing = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, id: &ArticleId) -> Result<()> {
        self.script.record(Call::Delete(id.clone()));
        self.script.latency(Op::Delete).await;
        self.script.outcome(Op::Delete)?;
        if self.script.failing_ids.lock().unwrap().contains(id) {
            return Err(scripted_failure(Some(&"Article is locked".to_string())));
        }
        self.articles.lock().unwrap().retain(|a| &a.id != id);
        Ok(())
    }
}

pub struct ScriptedEnrichment {
    pub script: Script,
    summary: Mutex<String>,
}

impl ScriptedEnrichment {
    pub fn new() -> Self {
        Self {
            script: Script::default(),
            summary: Mutex::new("Generated summary".to_string()),
        }
    }

    pub fn answer_summary(&self, summary: &str) {
        *self.summary.lock().unwrap() = summary.to_string();
    }
}

#[async_trait]
impl EnrichmentService for ScriptedEnrichment {
    fn name(&self) -> &str {
        "Scripted"
    }

    async fn summarize(&self, text: &str) -> Result<String> {
        self.script.record(Call::Summarize(text.to_string()));
        self.script.latency(Op::Summarize).await;
        self.script.outcome(Op::Summarize)?;
        Ok(self.summary.lock().unwrap().clone())
    }

    async fn improve(&self, text: &str) -> Result<String> {
        self.script.record(Call::Improve(text.to_string()));
        self.script.latency(Op::Improve).await;
        self.script.outcome(Op::Improve)?;
        Ok(format!("{} (improved)", text))
    }

    async fn apply_prompt(&self, text: &str, instruction: &str) -> Result<String> {
        self.script.record(Call::ApplyPrompt(text.to_string(), instruction.to_string()));
        self.script.latency(Op::ApplyPrompt).await;
        self.script.outcome(Op::ApplyPrompt)?;
        Ok(format!("{} [{}]", text, instruction))
    }
}
