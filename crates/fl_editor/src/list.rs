use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use fl_core::{Article, ArticleFilter, ArticleId, ContentService};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::EditorError;

const LOAD_FAILED: &str = "Failed to load articles";
const DELETE_FAILED: &str = "Failed to delete article";

/// Dashboard paging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListConfig {
    pub page: u32,
    pub limit: u32,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self { page: 1, limit: 50 }
    }
}

impl ListConfig {
    pub fn filter(&self) -> ArticleFilter {
        ArticleFilter::page(self.page, self.limit)
    }
}

/// Out-of-band confirmation asked before anything is deleted.
pub trait Confirm: Send + Sync {
    fn confirm(&self, article: &Article) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&Article) -> bool + Send + Sync,
{
    fn confirm(&self, article: &Article) -> bool {
        self(article)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The user said no; nothing was sent.
    Declined,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListSnapshot {
    pub items: Vec<Article>,
    /// Rows with a delete in flight; their delete action is disabled.
    pub pending: BTreeSet<ArticleId>,
    /// Last delete error per row.
    pub row_errors: BTreeMap<ArticleId, String>,
    pub load_error: Option<String>,
    pub loading: bool,
}

/// Owner of a view's article list. Rows leave the list only after the
/// server confirmed the delete.
pub struct ListMutationCoordinator {
    content: Arc<dyn ContentService>,
    state: watch::Sender<ListSnapshot>,
}

impl fmt::Debug for ListMutationCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snap = self.state.borrow();
        f.debug_struct("ListMutationCoordinator")
            .field("items", &snap.items.len())
            .field("pending", &snap.pending)
            .finish()
    }
}

impl ListMutationCoordinator {
    pub fn new(content: Arc<dyn ContentService>) -> Self {
        Self::with_items(content, Vec::new())
    }

    pub fn with_items(content: Arc<dyn ContentService>, items: Vec<Article>) -> Self {
        let (state, _) = watch::channel(ListSnapshot {
            items,
            ..Default::default()
        });
        Self { content, state }
    }

    pub fn subscribe(&self) -> watch::Receiver<ListSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ListSnapshot {
        self.state.borrow().clone()
    }

    pub fn items(&self) -> Vec<Article> {
        self.state.borrow().items.clone()
    }

    pub fn is_pending(&self, id: &ArticleId) -> bool {
        self.state.borrow().pending.contains(id)
    }

    pub fn row_error(&self, id: &ArticleId) -> Option<String> {
        self.state.borrow().row_errors.get(id).cloned()
    }

    /// Replace the list with one page from the server. On failure the list
    /// is emptied and the error kept for display.
    pub async fn load(&self, filter: &ArticleFilter) -> Result<usize, EditorError> {
        self.state.send_modify(|snap| {
            snap.loading = true;
            snap.load_error = None;
        });
        match self.content.list(filter).await {
            Ok(items) => {
                let count = items.len();
                self.state.send_modify(|snap| {
                    snap.items = items;
                    snap.row_errors.clear();
                    snap.loading = false;
                });
                Ok(count)
            }
            Err(err) => {
                warn!("Failed to load articles: {}", err);
                let message = err.user_message(LOAD_FAILED);
                self.state.send_modify(|snap| {
                    snap.items.clear();
                    snap.loading = false;
                    snap.load_error = Some(message.clone());
                });
                Err(EditorError::LoadFailed(message))
            }
        }
    }

    /// Delete one row after confirmation. Other rows, and concurrent deletes
    /// of other ids, are unaffected.
    pub async fn delete(&self, id: &ArticleId, confirm: &dyn Confirm) -> Result<DeleteOutcome, EditorError> {
        let article = {
            let snap = self.state.borrow();
            if snap.pending.contains(id) {
                return Err(EditorError::DeleteInFlight);
            }
            snap.items
                .iter()
                .find(|a| &a.id == id)
                .cloned()
                .ok_or_else(|| EditorError::Delete(format!("Article {} is not in this list", id)))?
        };

        if !confirm.confirm(&article) {
            return Ok(DeleteOutcome::Declined);
        }

        let mut claimed = false;
        self.state.send_if_modified(|snap| {
            claimed = snap.pending.insert(id.clone());
            if claimed {
                snap.row_errors.remove(id);
            }
            claimed
        });
        if !claimed {
            return Err(EditorError::DeleteInFlight);
        }

        let result = self.content.delete(id).await;
        match result {
            Ok(()) => {
                info!("🗑️ Deleted article {}", id);
                self.state.send_modify(|snap| {
                    snap.pending.remove(id);
                    snap.items.retain(|a| &a.id != id);
                });
                Ok(DeleteOutcome::Deleted)
            }
            Err(err) => {
                warn!("Failed to delete article {}: {}", id, err);
                let message = err.user_message(DELETE_FAILED);
                self.state.send_modify(|snap| {
                    snap.pending.remove(id);
                    snap.row_errors.insert(id.clone(), message.clone());
                });
                Err(EditorError::Delete(message))
            }
        }
    }
}
