use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use fl_core::{Article, ArticleFilter, ContentService, SearchCriteria};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

const SEARCH_FAILED: &str = "Failed to load articles";

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub debounce: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Idle,
    PendingDebounce,
    InFlight,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchSnapshot {
    /// Bumped on every criteria change.
    pub epoch: u64,
    pub criteria: SearchCriteria,
    pub phase: SearchPhase,
    pub results: Vec<Article>,
    /// Epoch the current `results` belong to.
    pub results_epoch: u64,
    pub error: Option<String>,
}

impl SearchSnapshot {
    fn new() -> Self {
        Self {
            epoch: 0,
            criteria: SearchCriteria::default(),
            phase: SearchPhase::Idle,
            results: Vec::new(),
            results_epoch: 0,
            error: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.phase != SearchPhase::Idle
    }
}

struct Shared {
    snapshot: watch::Sender<SearchSnapshot>,
    /// The debounce timer that has not fired yet, if any.
    timer: Mutex<Option<JoinHandle<()>>>,
}

/// Turns keystrokes into list queries: waits for input to settle, then
/// issues one request and keeps only the answer for the latest criteria.
///
/// Must be used from within a tokio runtime.
pub struct SearchQueryController {
    content: Arc<dyn ContentService>,
    config: SearchConfig,
    shared: Arc<Shared>,
}

impl fmt::Debug for SearchQueryController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchQueryController")
            .field("config", &self.config)
            .field("epoch", &self.shared.snapshot.borrow().epoch)
            .finish()
    }
}

impl SearchQueryController {
    pub fn new(content: Arc<dyn ContentService>, config: SearchConfig) -> Self {
        let (snapshot, _) = watch::channel(SearchSnapshot::new());
        Self {
            content,
            config,
            shared: Arc::new(Shared {
                snapshot,
                timer: Mutex::new(None),
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot> {
        self.shared.snapshot.subscribe()
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        self.shared.snapshot.borrow().clone()
    }

    /// Replace the criteria and restart the debounce timer. Returns the new
    /// epoch.
    pub fn set_criteria(&self, criteria: SearchCriteria) -> u64 {
        self.schedule(criteria, self.config.debounce)
    }

    /// Reload the current criteria without waiting, e.g. when a view opens.
    pub fn refresh(&self) -> u64 {
        let criteria = self.shared.snapshot.borrow().criteria.clone();
        self.schedule(criteria, Duration::ZERO)
    }

    fn schedule(&self, criteria: SearchCriteria, delay: Duration) -> u64 {
        let mut timer = self.shared.timer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(pending) = timer.take() {
            pending.abort();
        }

        let mut epoch = 0;
        self.shared.snapshot.send_modify(|snap| {
            snap.epoch += 1;
            epoch = snap.epoch;
            snap.criteria = criteria.clone();
            snap.phase = SearchPhase::PendingDebounce;
        });

        let shared = self.shared.clone();
        let content = self.content.clone();
        *timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            run_query(shared, content, epoch, criteria).await;
        }));
        epoch
    }
}

impl Drop for SearchQueryController {
    fn drop(&mut self) {
        if let Some(pending) = self.shared.timer.lock().unwrap_or_else(PoisonError::into_inner).take() {
            pending.abort();
        }
    }
}

async fn run_query(shared: Arc<Shared>, content: Arc<dyn ContentService>, epoch: u64, criteria: SearchCriteria) {
    {
        // Leave the timer slot so that later criteria changes no longer abort
        // this task: from here on it is only ever ignored, never cancelled.
        let mut timer = shared.timer.lock().unwrap_or_else(PoisonError::into_inner);
        if shared.snapshot.borrow().epoch != epoch {
            return;
        }
        timer.take();
        shared.snapshot.send_modify(|snap| snap.phase = SearchPhase::InFlight);
    }

    debug!("Searching articles (epoch {}): {:?}", epoch, criteria);
    let result = content.list(&ArticleFilter::from(&criteria)).await;

    shared.snapshot.send_if_modified(|snap| {
        if snap.epoch != epoch {
            debug!("Discarding results of superseded search (epoch {} < {})", epoch, snap.epoch);
            return false;
        }
        match &result {
            Ok(articles) => {
                snap.results = articles.clone();
                snap.error = None;
            }
            Err(err) => {
                warn!("Search failed: {}", err);
                snap.results.clear();
                snap.error = Some(err.user_message(SEARCH_FAILED));
            }
        }
        snap.results_epoch = epoch;
        snap.phase = SearchPhase::Idle;
        true
    });
}
