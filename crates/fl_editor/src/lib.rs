//! Client-side orchestration for the article editor: draft sessions with
//! save-then-summarize, debounced search and per-row list deletes.

pub mod draft;
pub mod error;
pub mod gate;
pub mod list;
pub mod search;
pub mod session;

#[cfg(test)]
mod test_utils;

pub use draft::DraftState;
pub use error::{EditorError, ValidationError};
pub use gate::{EnrichmentGate, GatePermit};
pub use list::{Confirm, DeleteOutcome, ListConfig, ListMutationCoordinator, ListSnapshot};
pub use search::{SearchConfig, SearchPhase, SearchQueryController, SearchSnapshot, DEFAULT_DEBOUNCE};
pub use session::{
    EditorMode, EditorSession, EditorSnapshot, EditorState, EnrichmentOutcome, EnrichmentStage, SubmitReport,
};
