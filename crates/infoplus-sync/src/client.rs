//! # HTTP Client
//!
//! reqwest-backed [`InfoplusApi`] implementation.
//!
//! ## Request Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  request(PUT, "item", body)                                            │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  retry_with_backoff ─────────────────────────────────────┐             │
//! │     │  per attempt:                                       │             │
//! │     ├── limiter.acquire(host)   identity + domain tokens  │ transient?  │
//! │     ├── base_url.join("item")   + API-Key header          │ sleep and   │
//! │     ├── send (10s timeout)                                │ go again    │
//! │     └── 2xx → JSON body  │  else → SyncError ────────────┘             │
//! │                                                                         │
//! │  Success(json) | Failure(last error message)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::api::{ApiResponse, InfoplusApi};
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::rate_limit::DualRateLimiter;
use crate::retry::{retry_with_backoff, RetryPolicy};

/// Header carrying the static API key.
pub const API_KEY_HEADER: &str = "API-Key";

/// Longest error body kept in failure messages.
const MAX_ERROR_BODY: usize = 500;

/// Rate-limited, retrying InfoPlus client.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: Url,
    host: String,
    api_key: String,
    limiter: Arc<DualRateLimiter>,
    retry: RetryPolicy,
    lob_id: i64,
    page_size: u32,
    timeout_secs: u64,
}

impl HttpClient {
    /// Builds a client with its own limiter.
    pub fn new(config: &SyncConfig) -> SyncResult<Self> {
        let limiter = Arc::new(DualRateLimiter::new(&config.rate_limit));
        Self::with_limiter(config, limiter)
    }

    /// Builds a client that shares an existing limiter.
    pub fn with_limiter(config: &SyncConfig, limiter: Arc<DualRateLimiter>) -> SyncResult<Self> {
        let base_url = config.api.base_url()?;
        let host = match (base_url.host_str(), base_url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(SyncError::InvalidUrl(format!(
                    "base URL has no host: {base_url}"
                )))
            }
        };

        let http = reqwest::Client::builder()
            .timeout(config.api.timeout())
            .build()
            .map_err(|e| SyncError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(HttpClient {
            http,
            base_url,
            host,
            api_key: config.api.api_key.clone(),
            limiter,
            retry: config.api.retry_policy(),
            lob_id: config.api.lob_id,
            page_size: config.api.page_size,
            timeout_secs: config.api.timeout_secs,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> SyncResult<Url> {
        Ok(self.base_url.join(endpoint.trim_start_matches('/'))?)
    }

    /// One attempt: limiter, send, status check, decode.
    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> SyncResult<Value> {
        self.limiter.acquire(&self.host).await;

        let url = self.url(endpoint)?;
        debug!(method = %method, url = %url, "InfoPlus request");

        let mut request = self
            .http
            .request(method, url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(ACCEPT, "application/json");
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            let mut body = text;
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(SyncError::Http {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
                body,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    fn transport_error(&self, err: reqwest::Error) -> SyncError {
        if err.is_timeout() {
            SyncError::Timeout(self.timeout_secs)
        } else {
            SyncError::from(err)
        }
    }
}

#[async_trait]
impl InfoplusApi for HttpClient {
    async fn try_get(&self, endpoint: &str, query: &[(&str, String)]) -> Result<Value, String> {
        self.send(Method::GET, endpoint, query, None)
            .await
            .map_err(|e| e.to_string())
    }

    async fn request(&self, method: Method, endpoint: &str, body: Option<&Value>) -> ApiResponse {
        let label = format!("{method} {endpoint}");
        let result = retry_with_backoff(&self.retry, &label, |_| {
            self.send(method.clone(), endpoint, &[], body)
        })
        .await;

        match result {
            Ok(value) => ApiResponse::Success(value),
            Err(err) => ApiResponse::Failure(err.to_string()),
        }
    }

    fn lob_id(&self) -> i64 {
        self.lob_id
    }

    fn page_size(&self) -> u32 {
        self.page_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Query, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::net::TcpListener;

    #[derive(Clone, Default)]
    struct MockState {
        posts: Arc<AtomicU32>,
    }

    async fn search(
        headers: HeaderMap,
        Query(params): Query<HashMap<String, String>>,
    ) -> Result<Json<Value>, StatusCode> {
        if headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) != Some("secret") {
            return Err(StatusCode::UNAUTHORIZED);
        }
        let page: u32 = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
        let items: Vec<Value> = match page {
            1 => vec![json!({"sku": "A"}), json!({"sku": "B"})],
            2 => vec![json!({"sku": "C"})],
            _ => Vec::new(),
        };
        Ok(Json(json!(items)))
    }

    async fn create_item(
        State(state): State<MockState>,
        Json(body): Json<Value>,
    ) -> Result<Json<Value>, StatusCode> {
        let attempt = state.posts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt < 3 {
            return Err(StatusCode::SERVICE_UNAVAILABLE);
        }
        Ok(Json(json!({"id": 77, "sku": body["sku"]})))
    }

    async fn bad_request() -> (StatusCode, &'static str) {
        (StatusCode::BAD_REQUEST, "lobId is required")
    }

    async fn spawn_mock() -> (String, MockState) {
        let state = MockState::default();
        let app = Router::new()
            .route("/api/item/search", get(search))
            .route("/api/item", post(create_item))
            .route("/api/customer", post(bad_request))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/api/"), state)
    }

    fn client(base_url: &str) -> HttpClient {
        let mut config = SyncConfig::default();
        config.api.api_key = "secret".into();
        config.api.base_url = Some(base_url.to_string());
        config.api.lob_id = 17;
        config.api.page_size = 2;
        config.api.initial_backoff_ms = 10;
        HttpClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_all_pages_over_http() {
        let (base, _) = spawn_mock().await;
        let client = client(&base);

        let records = client.fetch_all_pages("item/search", None).await;
        let skus: Vec<_> = records.iter().map(|r| r["sku"].as_str().unwrap()).collect();
        assert_eq!(skus, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_request_retries_server_errors() {
        let (base, state) = spawn_mock().await;
        let client = client(&base);

        let response = client
            .request(Method::POST, "item", Some(&json!({"sku": "ABC123"})))
            .await;

        assert_eq!(response, ApiResponse::Success(json!({"id": 77, "sku": "ABC123"})));
        assert_eq!(state.posts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_client_error_is_a_failure_value() {
        let (base, _) = spawn_mock().await;
        let client = client(&base);

        match client
            .request(Method::POST, "customer", Some(&json!({})))
            .await
        {
            ApiResponse::Failure(message) => {
                assert!(message.contains("400"), "{message}");
                assert!(message.contains("lobId is required"), "{message}");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_key_is_rejected() {
        let (base, _) = spawn_mock().await;
        let mut config = SyncConfig::default();
        config.api.api_key = "wrong".into();
        config.api.base_url = Some(base);
        let client = HttpClient::new(&config).unwrap();

        assert!(client.get("item/search", &[]).await.is_none());
        let err = client.try_get("item/search", &[]).await.unwrap_err();
        assert!(err.contains("401"), "{err}");
    }
}
