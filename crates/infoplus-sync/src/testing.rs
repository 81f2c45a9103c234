//! Scripted [`InfoplusApi`] for engine and reconciler tests.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use std::sync::{Arc, Mutex};

use crate::api::{ApiResponse, InfoplusApi};

type GetHandler = dyn Fn(&str, &[(String, String)]) -> Result<Value, String> + Send + Sync;
type RequestHandler = dyn Fn(&Method, &str, Option<&Value>) -> ApiResponse + Send + Sync;

/// One recorded write request.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub endpoint: String,
    pub body: Option<Value>,
}

/// In-process InfoPlus double. GETs and writes are answered by closures;
/// every call is recorded.
#[derive(Clone)]
pub struct FakeApi {
    lob_id: i64,
    page_size: u32,
    on_get: Arc<GetHandler>,
    on_request: Arc<RequestHandler>,
    gets: Arc<Mutex<Vec<(String, Vec<(String, String)>)>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl FakeApi {
    /// Empty remote: every search returns `[]`, every write fails.
    pub fn new() -> Self {
        FakeApi {
            lob_id: 17,
            page_size: 250,
            on_get: Arc::new(|_, _| Ok(Value::Array(Vec::new()))),
            on_request: Arc::new(|_, _, _| ApiResponse::Failure("no handler".to_string())),
            gets: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn on_get<F>(mut self, handler: F) -> Self
    where
        F: Fn(&str, &[(String, String)]) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.on_get = Arc::new(handler);
        self
    }

    pub fn on_request<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Method, &str, Option<&Value>) -> ApiResponse + Send + Sync + 'static,
    {
        self.on_request = Arc::new(handler);
        self
    }

    pub fn get_calls(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.gets.lock().unwrap().clone()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn write_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Default for FakeApi {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads one query parameter from a recorded GET.
pub fn query_param(query: &[(String, String)], key: &str) -> String {
    query
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
        .unwrap_or_default()
}

#[async_trait]
impl InfoplusApi for FakeApi {
    async fn try_get(&self, endpoint: &str, query: &[(&str, String)]) -> Result<Value, String> {
        let query: Vec<(String, String)> = query
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        self.gets
            .lock()
            .unwrap()
            .push((endpoint.to_string(), query.clone()));
        (self.on_get)(endpoint, &query)
    }

    async fn request(&self, method: Method, endpoint: &str, body: Option<&Value>) -> ApiResponse {
        self.requests.lock().unwrap().push(RecordedRequest {
            method: method.clone(),
            endpoint: endpoint.to_string(),
            body: body.cloned(),
        });
        (self.on_request)(&method, endpoint, body)
    }

    fn lob_id(&self) -> i64 {
        self.lob_id
    }

    fn page_size(&self) -> u32 {
        self.page_size
    }
}
