use std::fmt;

use fl_core::{Error, Result, TokenStore};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::ApiConfig;

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Shared plumbing for the REST endpoints: base URL resolution, bearer
/// token attachment and `{message}` error decoding.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    tokens: TokenStore,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("client", &"<reqwest::Client>")
            .field("base_url", &self.base_url.as_str())
            .field("tokens", &self.tokens)
            .finish()
    }
}

impl ApiClient {
    pub fn new(config: &ApiConfig, tokens: TokenStore) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            tokens,
        })
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Resolve path segments against the base URL. Segments are escaped, so
    /// ids can be passed as-is.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidUrl(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let url = self.endpoint(segments)?;
        let auth = self.tokens.context();
        tracing::debug!("{} {} ({:?})", method, url, auth);
        let mut request = self.client.request(method, url);
        if let Some(header) = auth.authorization() {
            request = request.header(AUTHORIZATION, header);
        }
        Ok(request)
    }

    /// Send a request and turn non-2xx answers into errors.
    pub async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message);
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("🔒 Server rejected credentials, clearing session");
            self.tokens.clear();
            return Err(Error::Unauthorized { message });
        }
        Err(Error::Api {
            status: status.as_u16(),
            message,
        })
    }

    pub async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
