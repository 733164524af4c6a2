use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    Api { status: u16, message: Option<String> },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {}", .message.as_deref().unwrap_or("session expired or invalid"))]
    Unauthorized { message: Option<String> },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Enrichment error: {0}")]
    Enrichment(String),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    /// The server-provided `{message}` if there was one, `fallback` otherwise.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Error::Api { message: Some(message), .. } | Error::Unauthorized { message: Some(message) }
                if !message.trim().is_empty() =>
            {
                message.clone()
            }
            Error::Validation(message) | Error::Enrichment(message) => message.clone(),
            _ => fallback.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_) | Error::Api { status: 404, .. })
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::InvalidUrl(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
