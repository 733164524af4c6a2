pub mod auth;
pub mod content;
pub mod enrichment;
pub mod error;
pub mod types;

pub use auth::{AuthContext, AuthService, Credentials, Registration, Session, TokenStore, User};
pub use content::ContentService;
pub use enrichment::EnrichmentService;
pub use error::{Error, Result};
pub use types::{
    normalize_tags, truncate_summary, Article, ArticleFields, ArticleFilter, ArticleId, AuthorRef,
    Category, SearchCriteria, SUMMARY_MAX_CHARS,
};
