//! # InfoPlus API Seam
//!
//! The engine talks to InfoPlus only through [`InfoplusApi`]. The HTTP
//! client implements it for production; tests swap in a scripted fake.
//!
//! ## Call Shapes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  try_get(endpoint, query)  → Ok(json) | Err(message)   no retry        │
//! │  get(endpoint, query)      → Some(json) | None         null ≡ failure  │
//! │  request(method, endpoint) → Success(json) | Failure   retried         │
//! │  fetch_all_pages(endpoint) → Vec<json>                 lobId scoped    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};

// =============================================================================
// Request Outcome
// =============================================================================

/// Result of a write request after retries: the decoded body or the last
/// failure message.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Success(Value),
    Failure(String),
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, ApiResponse::Success(_))
    }

    pub fn into_result(self) -> Result<Value, String> {
        match self {
            ApiResponse::Success(value) => Ok(value),
            ApiResponse::Failure(message) => Err(message),
        }
    }
}

// =============================================================================
// Filters
// =============================================================================

/// Quotes a value for an InfoPlus filter expression.
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Restricts a caller filter to one line of business.
pub fn scoped_filter(lob_id: i64, filter: Option<&str>) -> String {
    match filter.map(str::trim).filter(|f| !f.is_empty()) {
        Some(filter) => format!("lobId eq {lob_id} and ({filter})"),
        None => format!("lobId eq {lob_id}"),
    }
}

// =============================================================================
// Trait
// =============================================================================

/// Operations the sync engine needs from InfoPlus.
#[async_trait]
pub trait InfoplusApi: Send + Sync {
    /// Single GET without retry.
    async fn try_get(&self, endpoint: &str, query: &[(&str, String)]) -> Result<Value, String>;

    /// Write request with retry and backoff.
    async fn request(&self, method: Method, endpoint: &str, body: Option<&Value>) -> ApiResponse;

    /// Line of business every search is scoped to.
    fn lob_id(&self) -> i64;

    /// Records per search page.
    fn page_size(&self) -> u32;

    /// GET that folds failures into `None`.
    ///
    /// A JSON `null` body and a failed call both come back as `None`.
    async fn get(&self, endpoint: &str, query: &[(&str, String)]) -> Option<Value> {
        match self.try_get(endpoint, query).await {
            Ok(Value::Null) => None,
            Ok(value) => Some(value),
            Err(message) => {
                warn!(endpoint = %endpoint, error = %message, "GET failed");
                None
            }
        }
    }

    /// Collects every page of a search endpoint.
    ///
    /// Stops at the first page shorter than the page size, or at an empty,
    /// non-array or failed page.
    async fn fetch_all_pages(&self, endpoint: &str, filter: Option<&str>) -> Vec<Value> {
        let page_size = self.page_size() as usize;
        let filter = scoped_filter(self.lob_id(), filter);
        let mut records = Vec::new();
        let mut page = 1u32;

        if page_size == 0 {
            return records;
        }

        loop {
            let query = [
                ("filter", filter.clone()),
                ("page", page.to_string()),
                ("limit", page_size.to_string()),
            ];

            let items = match self.try_get(endpoint, &query).await {
                Ok(Value::Array(items)) => items,
                Ok(_) => {
                    debug!(endpoint = %endpoint, page, "Non-array page, stopping");
                    break;
                }
                Err(message) => {
                    warn!(endpoint = %endpoint, page, error = %message, "Page fetch failed, stopping");
                    break;
                }
            };

            let count = items.len();
            records.extend(items);

            if count < page_size {
                break;
            }
            page += 1;
        }

        debug!(endpoint = %endpoint, pages = page, records = records.len(), "Fetched all pages");
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{query_param, FakeApi};
    use serde_json::json;

    #[test]
    fn test_filters() {
        assert_eq!(quote("O'Brien"), "'O''Brien'");
        assert_eq!(scoped_filter(17, None), "lobId eq 17");
        assert_eq!(scoped_filter(17, Some("  ")), "lobId eq 17");
        assert_eq!(
            scoped_filter(17, Some("sku eq 'A'")),
            "lobId eq 17 and (sku eq 'A')"
        );
    }

    #[tokio::test]
    async fn test_pagination_stops_at_first_short_page() {
        let api = FakeApi::new().with_page_size(2).on_get(|_, query| {
            let page = query_param(query, "page");
            match page.as_str() {
                "1" => Ok(json!([{"id": 1}, {"id": 2}])),
                "2" => Ok(json!([{"id": 3}, {"id": 4}])),
                "3" => Ok(json!([{"id": 5}])),
                _ => panic!("fetched past the short page"),
            }
        });

        let records = api.fetch_all_pages("item/search", None).await;
        let ids: Vec<_> = records.iter().map(|r| r["id"].as_i64().unwrap()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(api.get_calls().len(), 3);
    }

    #[tokio::test]
    async fn test_pagination_stops_on_empty_or_failed_page() {
        let api = FakeApi::new().with_page_size(1).on_get(|_, query| {
            match query_param(query, "page").as_str() {
                "1" => Ok(json!([{"id": 1}])),
                _ => Ok(json!([])),
            }
        });
        assert_eq!(api.fetch_all_pages("carrier/search", None).await.len(), 1);

        let api = FakeApi::new().with_page_size(1).on_get(|_, query| {
            match query_param(query, "page").as_str() {
                "1" => Ok(json!([{"id": 1}])),
                _ => Err("HTTP 500".to_string()),
            }
        });
        assert_eq!(api.fetch_all_pages("carrier/search", None).await.len(), 1);
    }

    #[tokio::test]
    async fn test_pagination_injects_lob_filter() {
        let api = FakeApi::new().on_get(|_, _| Ok(json!([])));
        api.fetch_all_pages("inventoryDetail/search", Some("warehouseId eq 3"))
            .await;

        let calls = api.get_calls();
        assert_eq!(
            query_param(&calls[0].1, "filter"),
            "lobId eq 17 and (warehouseId eq 3)"
        );
        assert_eq!(query_param(&calls[0].1, "limit"), "250");
    }

    #[tokio::test]
    async fn test_get_treats_null_and_failure_alike() {
        let api = FakeApi::new().on_get(|endpoint, _| match endpoint {
            "a" => Ok(Value::Null),
            "b" => Err("timeout".to_string()),
            _ => Ok(json!({"ok": true})),
        });

        assert!(api.get("a", &[]).await.is_none());
        assert!(api.get("b", &[]).await.is_none());
        assert!(api.get("c", &[]).await.is_some());
    }
}
