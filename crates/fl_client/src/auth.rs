use async_trait::async_trait;
use fl_core::{AuthService, Credentials, Registration, Result, Session};
use reqwest::Method;

use crate::http::ApiClient;

#[derive(Debug, Clone)]
pub struct HttpAuthService {
    api: ApiClient,
}

impl HttpAuthService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    fn remember(&self, session: Session) -> Session {
        self.api.tokens().set(session.token.clone());
        tracing::info!("🔑 Signed in as {}", session.user.email);
        session
    }
}

#[async_trait]
impl AuthService for HttpAuthService {
    async fn login(&self, credentials: &Credentials) -> Result<Session> {
        let request = self.api.request(Method::POST, &["auth", "login"])?.json(credentials);
        let session: Session = self.api.json(request).await?;
        Ok(self.remember(session))
    }

    async fn signup(&self, registration: &Registration) -> Result<Session> {
        let request = self.api.request(Method::POST, &["auth", "register"])?.json(registration);
        let session: Session = self.api.json(request).await?;
        Ok(self.remember(session))
    }

    fn logout(&self) {
        self.api.tokens().clear();
        tracing::info!("👋 Signed out");
    }
}
