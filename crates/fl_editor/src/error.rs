use thiserror::Error;

/// Local checks made before anything is sent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Title is required")]
    MissingTitle,

    #[error("Content is required")]
    MissingContent,

    #[error("Category is required")]
    MissingCategory,

    #[error("Summary is {len} characters long, the limit is {max}")]
    SummaryTooLong { len: usize, max: usize },

    #[error("Write a prompt first")]
    MissingPrompt,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    LoadFailed(String),

    #[error("{0}")]
    Persist(String),

    #[error("{0}")]
    Enrichment(String),

    #[error("{0}")]
    Delete(String),

    #[error("A save is already in progress")]
    Busy,

    #[error("The draft cannot be edited while {0}")]
    NotEditable(&'static str),

    #[error("Another AI operation is already running")]
    EnrichmentInFlight,

    #[error("The draft changed while the AI operation was running")]
    Superseded,

    #[error("A delete is already in progress for this article")]
    DeleteInFlight,
}
