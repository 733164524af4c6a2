use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use fl_client::{ApiClient, ApiConfig, HttpAuthService, HttpContentService, RemoteEnrichment};
use fl_core::{
    ArticleFields, ArticleFilter, ArticleId, AuthService, Category, ContentService, Credentials,
    EnrichmentService, Error, TokenStore,
};
use serde_json::{json, Value};

#[derive(Default)]
struct Recorder {
    requests: Mutex<Vec<String>>,
    authorization: Mutex<Vec<Option<String>>>,
}

impl Recorder {
    fn record(&self, line: String, headers: &HeaderMap) {
        self.requests.lock().unwrap().push(line);
        self.authorization.lock().unwrap().push(
            headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        );
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn last_authorization(&self) -> Option<String> {
        self.authorization.lock().unwrap().last().cloned().flatten()
    }
}

type Shared = Arc<Recorder>;

fn article(id: &str, title: &str) -> Value {
    json!({
        "_id": id,
        "title": title,
        "content": "<p>Body</p>",
        "summary": "",
        "category": "technology",
        "tags": "rust, async",
        "author": "u1",
        "createdAt": "2024-03-01T10:00:00Z",
        "updatedAt": "2024-03-01T10:00:00Z"
    })
}

async fn list_articles(
    State(rec): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let mut keys: Vec<_> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    keys.sort();
    rec.record(format!("GET /articles?{}", keys.join("&")), &headers);
    if headers.get("authorization").and_then(|v| v.to_str().ok()) == Some("Bearer expired") {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Token expired"}))).into_response();
    }
    Json(json!({"items": [article("1", "First"), article("2", "Second")]})).into_response()
}

async fn get_article(State(rec): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> impl IntoResponse {
    rec.record(format!("GET /articles/{}", id), &headers);
    if id == "missing" {
        return (StatusCode::NOT_FOUND, Json(json!({"message": "Article not found"}))).into_response();
    }
    Json(article(&id, "Fetched")).into_response()
}

async fn similar_articles(State(rec): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> impl IntoResponse {
    rec.record(format!("GET /articles/{}/similar", id), &headers);
    Json(json!([article("9", "Neighbour")]))
}

async fn create_article(State(rec): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
    rec.record(format!("POST /articles {}", body), &headers);
    let mut created = article("new-1", body["title"].as_str().unwrap_or_default());
    created["summary"] = body["summary"].clone();
    (StatusCode::CREATED, Json(created))
}

async fn update_article(
    State(rec): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    rec.record(format!("PUT /articles/{} {}", id, body), &headers);
    let mut updated = article(&id, body["title"].as_str().unwrap_or_default());
    updated["summary"] = body["summary"].clone();
    updated["updatedAt"] = json!("2024-03-02T10:00:00Z");
    Json(updated)
}

async fn delete_article(State(rec): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> impl IntoResponse {
    rec.record(format!("DELETE /articles/{}", id), &headers);
    if id == "locked" {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn summarize(State(rec): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
    rec.record(format!("POST /ai/summary {}", body), &headers);
    Json(json!({"summary": "A short summary"}))
}

async fn improve(State(rec): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
    rec.record(format!("POST /ai/improve {}", body), &headers);
    Json(json!({"improved": format!("{} (improved)", body["text"].as_str().unwrap_or_default())}))
}

async fn apply_prompt(State(rec): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
    rec.record(format!("POST /ai/apply-prompt {}", body), &headers);
    Json(json!({"modified": format!("{} [{}]", body["text"].as_str().unwrap_or_default(), body["prompt"].as_str().unwrap_or_default())}))
}

async fn login(State(rec): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
    rec.record(format!("POST /auth/login {}", body["email"]), &headers);
    if body["password"] != "secret" {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Invalid credentials"}))).into_response();
    }
    Json(json!({"token": "tok-1", "user": {"_id": "u1", "name": "Ada", "email": body["email"]}})).into_response()
}

async fn spawn_api() -> (String, Shared) {
    let recorder: Shared = Arc::new(Recorder::default());
    let app = Router::new()
        .route("/api/articles", get(list_articles).post(create_article))
        .route("/api/articles/:id", get(get_article).put(update_article).delete(delete_article))
        .route("/api/articles/:id/similar", get(similar_articles))
        .route("/api/ai/summary", post(summarize))
        .route("/api/ai/improve", post(improve))
        .route("/api/ai/apply-prompt", post(apply_prompt))
        .route("/api/auth/login", post(login))
        .with_state(recorder.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}/api", addr), recorder)
}

fn api(base: &str, tokens: TokenStore) -> ApiClient {
    ApiClient::new(&ApiConfig::new(base).unwrap(), tokens).unwrap()
}

fn fields() -> ArticleFields {
    ArticleFields {
        title: "Hello".to_string(),
        content: "<p>World</p>".to_string(),
        summary: String::new(),
        category: Category::Science,
        tags: "a, b".to_string(),
    }
}

#[tokio::test]
async fn test_content_endpoints() {
    let (base, recorder) = spawn_api().await;
    let tokens = TokenStore::default();
    tokens.set("tok-1");
    let content = HttpContentService::new(api(&base, tokens));

    let filter = ArticleFilter {
        search: Some("rust".to_string()),
        category: Some(Category::Technology),
        ..ArticleFilter::page(1, 50)
    };
    let articles = content.list(&filter).await.unwrap();
    assert_eq!(articles.len(), 2);
    assert_eq!(articles[0].tags, vec!["rust", "async"]);
    assert_eq!(recorder.last_authorization().as_deref(), Some("Bearer tok-1"));

    let fetched = content.get(&ArticleId::from("7")).await.unwrap();
    assert_eq!(fetched.id.as_str(), "7");

    let similar = content.similar(&ArticleId::from("7")).await.unwrap();
    assert_eq!(similar[0].title, "Neighbour");

    let created = content.create(&fields()).await.unwrap();
    assert_eq!(created.id.as_str(), "new-1");
    assert_eq!(created.summary, None);

    let updated = content
        .update(&created.id, &fields().with_summary("Generated"))
        .await
        .unwrap();
    assert_eq!(updated.summary.as_deref(), Some("Generated"));
    assert!(updated.was_updated());

    content.delete(&ArticleId::from("7")).await.unwrap();

    let requests = recorder.requests();
    assert_eq!(
        requests[0],
        "GET /articles?category=technology&limit=50&page=1&search=rust"
    );
    assert_eq!(requests[1], "GET /articles/7");
    assert_eq!(requests[2], "GET /articles/7/similar");
    assert!(requests[3].starts_with("POST /articles "));
    assert!(requests[3].contains(r#""category":"science""#));
    assert!(requests[4].starts_with("PUT /articles/new-1 "));
    assert!(requests[4].contains(r#""summary":"Generated""#));
    assert_eq!(requests[5], "DELETE /articles/7");
}

#[tokio::test]
async fn test_error_messages_are_surfaced() {
    let (base, _recorder) = spawn_api().await;
    let content = HttpContentService::new(api(&base, TokenStore::default()));

    let err = content.get(&ArticleId::from("missing")).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.user_message("Failed to load article."), "Article not found");

    // No body at all falls back to the caller's message.
    let err = content.delete(&ArticleId::from("locked")).await.unwrap_err();
    assert!(matches!(err, Error::Api { status: 500, message: None }));
    assert_eq!(err.user_message("Failed to delete article"), "Failed to delete article");
}

#[tokio::test]
async fn test_unauthorized_clears_token() {
    let (base, _recorder) = spawn_api().await;
    let tokens = TokenStore::default();
    tokens.set("expired");
    let content = HttpContentService::new(api(&base, tokens.clone()));

    let err = content.list(&ArticleFilter::default()).await.unwrap_err();
    assert!(matches!(err, Error::Unauthorized { .. }));
    assert!(!tokens.is_authenticated());
}

#[tokio::test]
async fn test_enrichment_endpoints() {
    let (base, recorder) = spawn_api().await;
    let enrichment = RemoteEnrichment::new(api(&base, TokenStore::default()));

    assert_eq!(enrichment.summarize("text").await.unwrap(), "A short summary");
    assert_eq!(enrichment.improve("draft").await.unwrap(), "draft (improved)");
    assert_eq!(
        enrichment.apply_prompt("draft", "shorter").await.unwrap(),
        "draft [shorter]"
    );

    let requests = recorder.requests();
    assert_eq!(requests[0], r#"POST /ai/summary {"text":"text"}"#);
    assert_eq!(requests[1], r#"POST /ai/improve {"text":"draft"}"#);
    assert_eq!(
        requests[2],
        r#"POST /ai/apply-prompt {"prompt":"shorter","text":"draft"}"#
    );
    assert_eq!(recorder.last_authorization(), None);
}

#[tokio::test]
async fn test_login_stores_token() {
    let (base, recorder) = spawn_api().await;
    let tokens = TokenStore::default();
    let auth = HttpAuthService::new(api(&base, tokens.clone()));

    let err = auth
        .login(&Credentials {
            email: "ada@example.com".to_string(),
            password: "wrong".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Unauthorized { .. }));
    assert_eq!(err.user_message("Failed to login"), "Invalid credentials");
    assert!(!tokens.is_authenticated());

    let session = auth
        .login(&Credentials {
            email: "ada@example.com".to_string(),
            password: "secret".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(session.user.id, "u1");
    assert_eq!(tokens.context().authorization().as_deref(), Some("Bearer tok-1"));

    // Later requests carry the token.
    let content = HttpContentService::new(api(&base, tokens.clone()));
    content.get(&ArticleId::from("1")).await.unwrap();
    assert_eq!(recorder.last_authorization().as_deref(), Some("Bearer tok-1"));

    auth.logout();
    assert!(!tokens.is_authenticated());
}
