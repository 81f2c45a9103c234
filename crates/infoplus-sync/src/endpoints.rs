//! # Typed Remote Endpoints
//!
//! Thin, typed layer over [`InfoplusApi`]: natural-key lookups, list
//! fetches and create/update calls for each resource the engine touches.
//!
//! ## Resources
//! ```text
//! ┌──────────────────────┬─────────────────────────┬──────────────────────┐
//! │ resource             │ natural key filter      │ writes               │
//! ├──────────────────────┼─────────────────────────┼──────────────────────┤
//! │ item                 │ sku eq '…'              │ POST / PUT {id}      │
//! │ customer             │ customerNo eq '…'       │ POST / PUT {id}      │
//! │ order                │ customerOrderNo eq '…'  │ POST / PUT {orderNo} │
//! │ itemCategory         │ id eq '…' | name eq '…' │ POST / PUT           │
//! │ itemSubCategory      │ id eq '…' | name eq '…' │ POST / PUT           │
//! │ carrier              │ (full list)             │ none                 │
//! │ inventoryDetail      │ warehouseId eq N        │ none                 │
//! └──────────────────────┴─────────────────────────┴──────────────────────┘
//! ```

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::api::{quote, scoped_filter, ApiResponse, InfoplusApi};
use infoplus_core::carrier::Carrier;
use infoplus_core::payload::{InventoryDetail, RemoteOrder};
use infoplus_core::CategoryKind;

/// Orders per `orderNo` batch query.
pub const ORDER_BATCH_SIZE: usize = 50;

/// Outcome of a natural-key lookup.
///
/// A failed lookup is kept apart from "not found" so a transport error is
/// never mistaken for a missing record.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found(Value),
    NotFound,
    Failed(String),
}

impl Lookup {
    fn from_search(result: Result<Value, String>) -> Self {
        match result {
            Ok(Value::Array(mut items)) => {
                if items.is_empty() {
                    Lookup::NotFound
                } else {
                    Lookup::Found(items.swap_remove(0))
                }
            }
            Ok(Value::Null) => Lookup::NotFound,
            Ok(value @ Value::Object(_)) => Lookup::Found(value),
            Ok(other) => Lookup::Failed(format!("unexpected search response: {other}")),
            Err(message) => Lookup::Failed(message),
        }
    }
}

/// Typed view of the InfoPlus API.
#[derive(Clone, Copy)]
pub struct Endpoints<'a> {
    api: &'a dyn InfoplusApi,
}

impl<'a> Endpoints<'a> {
    pub fn new(api: &'a dyn InfoplusApi) -> Self {
        Endpoints { api }
    }

    pub fn lob_id(&self) -> i64 {
        self.api.lob_id()
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// First record of `{resource}/search` matching `filter` in this LOB.
    pub async fn search_one(&self, resource: &str, filter: &str) -> Lookup {
        let endpoint = format!("{resource}/search");
        let query = [
            ("filter", scoped_filter(self.api.lob_id(), Some(filter))),
            ("page", "1".to_string()),
            ("limit", "1".to_string()),
        ];
        debug!(endpoint = %endpoint, filter = %filter, "Natural key lookup");
        Lookup::from_search(self.api.try_get(&endpoint, &query).await)
    }

    pub async fn find_item(&self, sku: &str) -> Lookup {
        self.search_one("item", &format!("sku eq {}", quote(sku)))
            .await
    }

    pub async fn find_customer(&self, customer_no: &str) -> Lookup {
        self.search_one("customer", &format!("customerNo eq {}", quote(customer_no)))
            .await
    }

    pub async fn find_order(&self, customer_order_no: &str) -> Lookup {
        self.search_one(
            "order",
            &format!("customerOrderNo eq {}", quote(customer_order_no)),
        )
        .await
    }

    /// Looks a category up by its native id, falling back to its name.
    pub async fn find_category(
        &self,
        kind: CategoryKind,
        remote_id_raw: Option<&str>,
        name: &str,
    ) -> Lookup {
        if let Some(raw) = remote_id_raw.filter(|r| !r.trim().is_empty()) {
            match self
                .search_one(kind.endpoint(), &format!("id eq {}", quote(raw)))
                .await
            {
                Lookup::NotFound => {}
                other => return other,
            }
        }
        self.search_one(kind.endpoint(), &format!("name eq {}", quote(name)))
            .await
    }

    // =========================================================================
    // Lists
    // =========================================================================

    /// Whole remote category or subcategory catalog for this LOB.
    pub async fn categories(&self, kind: CategoryKind) -> Vec<Value> {
        self.api
            .fetch_all_pages(&format!("{}/search", kind.endpoint()), None)
            .await
    }

    /// Remote carrier list, every page. Empty when the first page fails.
    pub async fn carriers(&self) -> Vec<Carrier> {
        self.api
            .fetch_all_pages("carrier/search", None)
            .await
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<Carrier>(item) {
                Ok(carrier) => Some(carrier),
                Err(e) => {
                    warn!(error = %e, "Skipping malformed carrier");
                    None
                }
            })
            .collect()
    }

    /// Remote orders for a set of order numbers, queried in batches.
    pub async fn orders_by_numbers(&self, order_nos: &[i64]) -> Vec<RemoteOrder> {
        let mut orders = Vec::new();

        for chunk in order_nos.chunks(ORDER_BATCH_SIZE) {
            let filter = chunk
                .iter()
                .map(|no| format!("orderNo eq {no}"))
                .collect::<Vec<_>>()
                .join(" or ");

            let records = self
                .api
                .fetch_all_pages("order/search", Some(&format!("({filter})")))
                .await;
            orders.extend(records.iter().filter_map(RemoteOrder::from_value));
        }

        orders
    }

    /// Inventory detail rows for one warehouse.
    pub async fn inventory_details(&self, warehouse_id: i64) -> Vec<InventoryDetail> {
        self.api
            .fetch_all_pages(
                "inventoryDetail/search",
                Some(&format!("warehouseId eq {warehouse_id}")),
            )
            .await
            .into_iter()
            .filter_map(|row| match serde_json::from_value::<InventoryDetail>(row) {
                Ok(detail) => Some(detail),
                Err(e) => {
                    warn!(error = %e, "Skipping malformed inventory row");
                    None
                }
            })
            .collect()
    }

    // =========================================================================
    // Writes
    // =========================================================================

    pub async fn create<T: Serialize>(&self, resource: &str, body: &T) -> ApiResponse {
        self.write(Method::POST, resource, body).await
    }

    pub async fn update<T: Serialize>(&self, resource: &str, body: &T) -> ApiResponse {
        self.write(Method::PUT, resource, body).await
    }

    async fn write<T: Serialize>(&self, method: Method, resource: &str, body: &T) -> ApiResponse {
        let body = match serde_json::to_value(body) {
            Ok(body) => body,
            Err(e) => return ApiResponse::Failure(format!("failed to encode {resource}: {e}")),
        };
        self.api.request(method, resource, Some(&body)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{query_param, FakeApi};
    use infoplus_core::carrier::resolve_carriers;
    use serde_json::json;

    #[tokio::test]
    async fn test_lookup_distinguishes_failure_from_missing() {
        let api = FakeApi::new().on_get(|_, query| {
            let filter = query_param(query, "filter");
            if filter.contains("'ABC123'") {
                Ok(json!([{"id": 77, "sku": "ABC123"}]))
            } else if filter.contains("'BROKEN'") {
                Err("HTTP 502".to_string())
            } else {
                Ok(json!([]))
            }
        });
        let remote = Endpoints::new(&api);

        assert_eq!(
            remote.find_item("ABC123").await,
            Lookup::Found(json!({"id": 77, "sku": "ABC123"}))
        );
        assert_eq!(remote.find_item("NOPE").await, Lookup::NotFound);
        assert!(matches!(remote.find_item("BROKEN").await, Lookup::Failed(_)));

        let calls = api.get_calls();
        assert_eq!(calls[0].0, "item/search");
        assert_eq!(query_param(&calls[0].1, "filter"), "lobId eq 17 and (sku eq 'ABC123')");
    }

    #[tokio::test]
    async fn test_category_lookup_falls_back_to_name() {
        let api = FakeApi::new().on_get(|_, query| {
            if query_param(query, "filter").contains("name eq 'Shoes'") {
                Ok(json!([{"id": "SHO", "internalId": 5, "name": "Shoes"}]))
            } else {
                Ok(json!([]))
            }
        });
        let remote = Endpoints::new(&api);

        let found = remote
            .find_category(CategoryKind::SubCategory, Some("OLD"), "Shoes")
            .await;
        assert!(matches!(found, Lookup::Found(_)));

        let calls = api.get_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, "itemSubCategory/search");
        assert!(query_param(&calls[0].1, "filter").contains("id eq 'OLD'"));
    }

    #[tokio::test]
    async fn test_orders_are_batched() {
        let api = FakeApi::new().on_get(|_, _| Ok(json!([{"orderNo": 1, "status": "Shipped"}])));
        let remote = Endpoints::new(&api);

        let numbers: Vec<i64> = (1..=120).collect();
        let orders = remote.orders_by_numbers(&numbers).await;

        assert_eq!(api.get_calls().len(), 3);
        assert_eq!(orders.len(), 3);
        let first_filter = query_param(&api.get_calls()[0].1, "filter");
        assert!(first_filter.starts_with("lobId eq 17 and ((orderNo eq 1 or orderNo eq 2"));
        assert!(first_filter.contains("orderNo eq 50)"));
    }

    #[tokio::test]
    async fn test_carriers_read_every_page() {
        let api = FakeApi::new().with_page_size(2).on_get(|_, query| {
            match query_param(query, "page").as_str() {
                "1" => Ok(json!([
                    {"carrier": 1, "label": "UPS Ground"},
                    {"carrier": 2, "label": "FedEx"}
                ])),
                "2" => Ok(json!([{"carrier": 7, "label": "Freight Truck"}])),
                _ => Ok(json!([])),
            }
        });
        let remote = Endpoints::new(&api);

        let carriers = remote.carriers().await;
        assert_eq!(carriers.len(), 3);
        assert_eq!(carriers[2].carrier, 7);
        assert_eq!(api.get_calls().len(), 2);
        assert_eq!(resolve_carriers(&carriers, 1).truck, 7);
    }

    #[tokio::test]
    async fn test_carriers_and_inventory_parsing() {
        let api = FakeApi::new().on_get(|endpoint, _| match endpoint {
            "carrier/search" => Ok(json!([
                {"carrier": 100, "label": "LTL Truck"},
                {"label": "no id"},
                {"carrier": 1, "label": "UPS Ground"}
            ])),
            "inventoryDetail/search" => Ok(json!([
                {"sku": "A", "quantity": 3.0, "warehouseId": 3},
                {"quantity": 1.0}
            ])),
            _ => Ok(json!([])),
        });
        let remote = Endpoints::new(&api);

        let carriers = remote.carriers().await;
        assert_eq!(carriers.len(), 2);
        assert_eq!(carriers[1].carrier, 1);

        let details = remote.inventory_details(3).await;
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].sku, "A");
    }
}
