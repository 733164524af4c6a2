use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::pick_id;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawUser")]
pub struct User {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
}

#[derive(Deserialize)]
struct RawUser {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, rename = "_id")]
    mongo_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    email: String,
}

impl TryFrom<RawUser> for User {
    type Error = String;

    fn try_from(raw: RawUser) -> std::result::Result<Self, Self::Error> {
        Ok(User {
            id: pick_id(raw.id, raw.mongo_id, "user")?,
            name: raw.name,
            email: raw.email,
        })
    }
}

/// What `/auth/login` and `/auth/register` hand back.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Serialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Immutable snapshot of the credentials attached to one request.
#[derive(Clone, Default, PartialEq)]
pub struct AuthContext {
    token: Option<String>,
}

impl AuthContext {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Value for the `Authorization` header, if any.
    pub fn authorization(&self) -> Option<String> {
        self.token.as_ref().map(|token| format!("Bearer {}", token))
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("token", &self.token.as_deref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Holder of the bearer token. Set on login/signup, cleared on logout or on
/// any 401. Clones share the same slot.
#[derive(Clone, Default)]
pub struct TokenStore {
    token: Arc<RwLock<Option<String>>>,
}

impl TokenStore {
    /// The process-wide store.
    pub fn global() -> &'static TokenStore {
        static STORE: OnceLock<TokenStore> = OnceLock::new();
        STORE.get_or_init(TokenStore::default)
    }

    pub fn set(&self, token: impl Into<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.into());
    }

    pub fn clear(&self) {
        let previous = self.token.write().unwrap_or_else(PoisonError::into_inner).take();
        if previous.is_some() {
            tracing::debug!("Cleared stored bearer token");
        }
    }

    pub fn context(&self) -> AuthContext {
        AuthContext {
            token: self.token.read().unwrap_or_else(PoisonError::into_inner).clone(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }
}

impl fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStore")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Exchange credentials for a session and store its token
    async fn login(&self, credentials: &Credentials) -> Result<Session>;

    /// Register a new account and store its token
    async fn signup(&self, registration: &Registration) -> Result<Session>;

    /// Forget the stored token
    fn logout(&self);
}
