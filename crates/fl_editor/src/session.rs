use std::fmt;
use std::sync::Arc;

use fl_core::{truncate_summary, Article, ArticleFields, ArticleId, ContentService, EnrichmentService};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::draft::DraftState;
use crate::error::{EditorError, ValidationError};
use crate::gate::{EnrichmentGate, GatePermit};

const LOAD_FAILED: &str = "Failed to load article.";
const NOT_FOUND: &str = "Article not found.";
const SAVE_FAILED: &str = "Failed to save article";
const IMPROVE_FAILED: &str = "Failed to improve content";
const PROMPT_FAILED: &str = "Failed to apply prompt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Edit(ArticleId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditorState {
    /// Fetching the article being edited.
    Loading,
    /// Editable; submit and transforms are enabled.
    Ready,
    /// Primary save in flight.
    Saving,
    /// Saved; generating and attaching a summary.
    Enriching,
    /// Saved. Terminal: the view should navigate back to the list.
    Settled,
    /// The article could not be loaded. Terminal.
    LoadFailed(String),
}

impl EditorState {
    pub fn name(&self) -> &'static str {
        match self {
            EditorState::Loading => "loading",
            EditorState::Ready => "ready",
            EditorState::Saving => "saving",
            EditorState::Enriching => "enriching",
            EditorState::Settled => "settled",
            EditorState::LoadFailed(_) => "failed to load",
        }
    }
}

/// Everything a view needs to render the editor.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorSnapshot {
    pub state: EditorState,
    pub draft: DraftState,
    /// Last error to show inline, cleared by the next submit or transform.
    pub error: Option<String>,
    /// Non-fatal notice left by the enrichment step.
    pub notice: Option<String>,
    /// An improve / custom-prompt call is outstanding.
    pub transforming: bool,
    /// Bumped whenever `draft.content` changes.
    pub content_revision: u64,
    pub saved: Option<Article>,
}

impl EditorSnapshot {
    fn new(state: EditorState) -> Self {
        Self {
            state,
            draft: DraftState::default(),
            error: None,
            notice: None,
            transforming: false,
            content_revision: 0,
            saved: None,
        }
    }

    pub fn can_submit(&self) -> bool {
        self.state == EditorState::Ready && self.draft.validate().is_ok()
    }

    /// The save finished; time to leave the editor.
    pub fn should_leave(&self) -> bool {
        self.state == EditorState::Settled
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichmentStage {
    Summarize,
    Patch,
}

impl fmt::Display for EnrichmentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnrichmentStage::Summarize => f.write_str("summarize"),
            EnrichmentStage::Patch => f.write_str("patch"),
        }
    }
}

/// What happened after the primary save.
#[derive(Debug, Clone, PartialEq)]
pub enum EnrichmentOutcome {
    /// A summary was provided, or there was no content to summarize.
    NotNeeded,
    /// The service returned an empty summary; nothing was patched.
    NoSummary,
    /// The generated summary was saved onto the article.
    Applied { summary: String },
    /// The article is saved, but without a summary. `generated` holds the
    /// summary when it was produced and only the patch failed.
    Failed {
        stage: EnrichmentStage,
        message: String,
        generated: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmitReport {
    /// The article as last acknowledged by the server.
    pub article: Article,
    pub enrichment: EnrichmentOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transform {
    Improve,
    Prompt,
}

/// Resets the `transforming` flag however the transform ends.
struct TransformGuard<'a> {
    state: &'a watch::Sender<EditorSnapshot>,
    _permit: GatePermit,
}

impl Drop for TransformGuard<'_> {
    fn drop(&mut self) {
        self.state.send_if_modified(|snap| std::mem::replace(&mut snap.transforming, false));
    }
}

/// Owns one draft from opening to the final save.
pub struct EditorSession {
    mode: EditorMode,
    content: Arc<dyn ContentService>,
    enrichment: Arc<dyn EnrichmentService>,
    gate: EnrichmentGate,
    state: watch::Sender<EditorSnapshot>,
}

impl fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorSession")
            .field("mode", &self.mode)
            .field("enrichment", &self.enrichment.name())
            .field("state", &self.state.borrow().state)
            .finish()
    }
}

impl EditorSession {
    /// A session for a new article, ready for input.
    pub fn create(content: Arc<dyn ContentService>, enrichment: Arc<dyn EnrichmentService>) -> Self {
        Self::with_mode(EditorMode::Create, EditorState::Ready, content, enrichment)
    }

    /// A session for an existing article. Starts in `Loading`; call `load`.
    pub fn edit(
        id: ArticleId,
        content: Arc<dyn ContentService>,
        enrichment: Arc<dyn EnrichmentService>,
    ) -> Self {
        Self::with_mode(EditorMode::Edit(id), EditorState::Loading, content, enrichment)
    }

    fn with_mode(
        mode: EditorMode,
        initial: EditorState,
        content: Arc<dyn ContentService>,
        enrichment: Arc<dyn EnrichmentService>,
    ) -> Self {
        let (state, _) = watch::channel(EditorSnapshot::new(initial));
        Self {
            mode,
            content,
            enrichment,
            gate: EnrichmentGate::new(),
            state,
        }
    }

    pub fn mode(&self) -> &EditorMode {
        &self.mode
    }

    pub fn snapshot(&self) -> EditorSnapshot {
        self.state.borrow().clone()
    }

    pub fn state(&self) -> EditorState {
        self.state.borrow().state.clone()
    }

    pub fn draft(&self) -> DraftState {
        self.state.borrow().draft.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<EditorSnapshot> {
        self.state.subscribe()
    }

    /// Fetch the article for an edit session. A failure is terminal.
    pub async fn load(&self) -> Result<(), EditorError> {
        let EditorMode::Edit(id) = &self.mode else {
            return Ok(());
        };
        let current = self.state();
        if current != EditorState::Loading {
            return Err(EditorError::NotEditable(current.name()));
        }

        match self.content.get(id).await {
            Ok(article) => {
                debug!("Loaded article {} for editing", article.id);
                self.state.send_modify(|snap| {
                    snap.draft = DraftState::from_article(&article);
                    snap.content_revision += 1;
                    snap.state = EditorState::Ready;
                });
                Ok(())
            }
            Err(err) => {
                let message = if err.is_not_found() { NOT_FOUND } else { LOAD_FAILED };
                warn!("Failed to load article {}: {}", id, err);
                self.state.send_modify(|snap| {
                    snap.state = EditorState::LoadFailed(message.to_string());
                    snap.error = Some(message.to_string());
                });
                Err(EditorError::LoadFailed(message.to_string()))
            }
        }
    }

    /// Apply user input to the draft. Only allowed while `Ready`.
    pub fn update_draft(&self, edit: impl FnOnce(&mut DraftState)) -> Result<(), EditorError> {
        let mut result = Ok(());
        self.state.send_if_modified(|snap| {
            if snap.state != EditorState::Ready {
                result = Err(EditorError::NotEditable(snap.state.name()));
                return false;
            }
            let before = snap.draft.content.clone();
            edit(&mut snap.draft);
            if snap.draft.content != before {
                snap.content_revision += 1;
            }
            true
        });
        result
    }

    pub fn set_title(&self, title: impl Into<String>) -> Result<(), EditorError> {
        let title = title.into();
        self.update_draft(|draft| draft.title = title)
    }

    pub fn set_content(&self, content: impl Into<String>) -> Result<(), EditorError> {
        let content = content.into();
        self.update_draft(|draft| draft.content = content)
    }

    pub fn set_summary(&self, summary: impl Into<String>) -> Result<(), EditorError> {
        let summary = summary.into();
        self.update_draft(|draft| draft.summary = summary)
    }

    pub fn set_category(&self, category: Option<fl_core::Category>) -> Result<(), EditorError> {
        self.update_draft(|draft| draft.category = category)
    }

    pub fn set_tags(&self, tags: impl Into<String>) -> Result<(), EditorError> {
        let tags = tags.into();
        self.update_draft(|draft| draft.tags = tags)
    }

    pub fn set_prompt(&self, prompt: impl Into<String>) -> Result<(), EditorError> {
        let prompt = prompt.into();
        self.update_draft(|draft| draft.prompt = prompt)
    }

    /// Save the draft, then attach a generated summary if the draft had none.
    ///
    /// Validation failures leave the session untouched and send nothing. A
    /// failed save returns the session to `Ready` with the error shown. Once
    /// the save succeeds the session settles, whatever the enrichment step
    /// does.
    pub async fn submit(&self) -> Result<SubmitReport, EditorError> {
        let fields = self.begin_save()?;

        let persisted = match &self.mode {
            EditorMode::Create => self.content.create(&fields).await,
            EditorMode::Edit(id) => self.content.update(id, &fields).await,
        };
        let article = match persisted {
            Ok(article) => article,
            Err(err) => {
                let message = err.user_message(SAVE_FAILED);
                warn!("❌ Save failed: {}", err);
                self.state.send_modify(|snap| {
                    snap.state = EditorState::Ready;
                    snap.error = Some(message.clone());
                });
                return Err(EditorError::Persist(message));
            }
        };
        info!("💾 Saved article {}", article.id);

        let (article, enrichment) = if fields.summary.is_empty() && article.has_content() {
            self.state.send_modify(|snap| snap.state = EditorState::Enriching);
            self.attach_summary(article, &fields).await
        } else {
            (article, EnrichmentOutcome::NotNeeded)
        };

        let notice = match &enrichment {
            EnrichmentOutcome::Failed { message, .. } => Some(message.clone()),
            _ => None,
        };
        self.state.send_modify(|snap| {
            snap.state = EditorState::Settled;
            snap.notice = notice;
            snap.saved = Some(article.clone());
        });

        Ok(SubmitReport { article, enrichment })
    }

    /// Checks the guard and moves `Ready -> Saving` in one step.
    fn begin_save(&self) -> Result<ArticleFields, EditorError> {
        let mut result = Err(EditorError::Busy);
        self.state.send_if_modified(|snap| {
            match snap.state {
                EditorState::Ready => {}
                EditorState::Saving | EditorState::Enriching => return false,
                ref other => {
                    result = Err(EditorError::NotEditable(other.name()));
                    return false;
                }
            }
            match snap.draft.validate() {
                Ok(fields) => {
                    result = Ok(fields);
                    snap.state = EditorState::Saving;
                    snap.error = None;
                    snap.notice = None;
                    true
                }
                Err(err) => {
                    debug!("Submit ignored: {}", err);
                    result = Err(err.into());
                    false
                }
            }
        });
        result
    }

    /// Best effort: generate a summary and patch it onto the saved article.
    async fn attach_summary(&self, article: Article, fields: &ArticleFields) -> (Article, EnrichmentOutcome) {
        // The only caller that waits on the gate instead of being turned away:
        // a transform still running has its result discarded once the session
        // leaves `Ready`.
        let _permit = match self.gate.enter().await {
            Ok(permit) => permit,
            Err(err) => {
                return (
                    article,
                    EnrichmentOutcome::Failed {
                        stage: EnrichmentStage::Summarize,
                        message: err.to_string(),
                        generated: None,
                    },
                )
            }
        };

        info!("🤖 Generating summary for article {}", article.id);
        let summary = match self.enrichment.summarize(&article.content).await {
            Ok(summary) => truncate_summary(&summary),
            Err(err) => {
                warn!("⚠️ Summary generation failed for {}: {}", article.id, err);
                let message = format!(
                    "Article saved, but the summary could not be generated: {}",
                    err.user_message("the AI service is unavailable")
                );
                return (
                    article,
                    EnrichmentOutcome::Failed {
                        stage: EnrichmentStage::Summarize,
                        message,
                        generated: None,
                    },
                );
            }
        };
        if summary.is_empty() {
            debug!("Summary service returned nothing for {}", article.id);
            return (article, EnrichmentOutcome::NoSummary);
        }

        match self.content.update(&article.id, &fields.with_summary(summary.clone())).await {
            Ok(patched) => {
                info!("✨ Summary attached to article {}", patched.id);
                (patched, EnrichmentOutcome::Applied { summary })
            }
            Err(err) => {
                warn!("⚠️ Failed to attach summary to {}: {}", article.id, err);
                let message = format!(
                    "Article saved, but the summary could not be stored: {}",
                    err.user_message("request failed")
                );
                (
                    article,
                    EnrichmentOutcome::Failed {
                        stage: EnrichmentStage::Patch,
                        message,
                        generated: Some(summary),
                    },
                )
            }
        }
    }

    /// Ask the AI service to improve the draft content.
    pub async fn improve(&self) -> Result<String, EditorError> {
        self.transform(Transform::Improve).await
    }

    /// Rewrite the draft content following `draft.prompt`.
    pub async fn apply_prompt(&self) -> Result<String, EditorError> {
        self.transform(Transform::Prompt).await
    }

    async fn transform(&self, kind: Transform) -> Result<String, EditorError> {
        let (text, instruction, revision) = {
            let snap = self.state.borrow();
            if snap.state != EditorState::Ready {
                return Err(EditorError::NotEditable(snap.state.name()));
            }
            if snap.draft.content.trim().is_empty() {
                return Err(ValidationError::MissingContent.into());
            }
            if kind == Transform::Prompt && snap.draft.prompt.trim().is_empty() {
                return Err(ValidationError::MissingPrompt.into());
            }
            (
                snap.draft.content.clone(),
                snap.draft.prompt.trim().to_string(),
                snap.content_revision,
            )
        };

        let permit = self.gate.try_enter()?;
        self.state.send_modify(|snap| {
            snap.transforming = true;
            snap.error = None;
        });
        let _guard = TransformGuard {
            state: &self.state,
            _permit: permit,
        };

        let (result, fallback) = match kind {
            Transform::Improve => (self.enrichment.improve(&text).await, IMPROVE_FAILED),
            Transform::Prompt => (self.enrichment.apply_prompt(&text, &instruction).await, PROMPT_FAILED),
        };
        let revised = match result {
            Ok(revised) => revised,
            Err(err) => {
                let message = err.user_message(fallback);
                warn!("⚠️ {}: {}", fallback, err);
                self.state.send_modify(|snap| snap.error = Some(message.clone()));
                return Err(EditorError::Enrichment(message));
            }
        };

        let mut applied = false;
        self.state.send_if_modified(|snap| {
            if snap.state != EditorState::Ready || snap.content_revision != revision {
                return false;
            }
            snap.draft.content = revised.clone();
            snap.content_revision += 1;
            applied = true;
            true
        });
        if !applied {
            debug!("Dropping stale transform result");
            return Err(EditorError::Superseded);
        }
        Ok(revised)
    }
}
