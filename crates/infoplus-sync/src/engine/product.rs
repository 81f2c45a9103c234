//! Product → `item` sync, keyed by SKU.
//!
//! InfoPlus requires a major and sub group on every item. A product
//! without one borrows the classification of the matching remote item
//! (and keeps it locally) before the item is given up on.

use tracing::{debug, info};

use super::{item_result, ItemOutcome, SyncEngine};
use crate::endpoints::Lookup;
use crate::error::SyncResult;
use infoplus_core::payload::{remote_id, remote_id_field, ItemPayload};
use infoplus_core::validation::validate_sku;
use infoplus_core::{EntityType, ItemResult, Product, SyncKind, SyncOutcome};

const RESOURCE: &str = "item";

impl SyncEngine {
    pub(crate) async fn sync_products(&self) -> SyncResult<SyncOutcome> {
        let products = self.db.products().list_for_sync().await?;
        if products.is_empty() {
            return Ok(SyncOutcome::error("No products to sync"));
        }

        info!(count = products.len(), "Syncing products");

        let mut results = Vec::with_capacity(products.len());
        for product in &products {
            results.push(self.push_product(product).await);
        }

        Ok(SyncOutcome::completed(results))
    }

    /// Syncs one product by local id.
    pub async fn sync_product(&self, product_id: &str) -> SyncResult<ItemResult> {
        match self.db.products().get_by_id(product_id).await? {
            Some(product) => Ok(self.push_product(&product).await),
            None => Ok(ItemResult::failed(product_id, "product not found")),
        }
    }

    async fn push_product(&self, product: &Product) -> ItemResult {
        let outcome = self.try_push_product(product).await;
        item_result(SyncKind::Products, &product.sku, outcome)
    }

    async fn try_push_product(&self, product: &Product) -> ItemOutcome {
        validate_sku(&product.sku).map_err(|e| e.to_string())?;

        let existing = match self.remote().find_item(&product.sku).await {
            Lookup::Failed(e) => return Err(format!("item lookup failed: {e}")),
            Lookup::Found(remote) => Some(remote),
            Lookup::NotFound => None,
        };

        let mut product = product.clone();
        if product.classification().is_none() {
            if let Some((major, sub)) = existing.as_ref().and_then(remote_classification) {
                debug!(sku = %product.sku, major, sub, "Backfilling classification from InfoPlus");
                self.db
                    .products()
                    .set_classification(&product.id, major, sub)
                    .await
                    .map_err(|e| e.to_string())?;
                product.major_group_id = Some(major);
                product.sub_group_id = Some(sub);
            }
        }

        let payload = ItemPayload::from_product(&product, self.lob_id()).map_err(|e| e.to_string())?;

        match existing {
            Some(remote) => {
                let remote_id = remote_id(&remote).ok_or("remote item has no id")?;
                self.align_mapping(EntityType::Item, &product.id, remote_id)
                    .await?;
                self.remote()
                    .update(RESOURCE, &payload.with_id(remote_id))
                    .await
                    .into_result()?;
                self.touch_mapping(EntityType::Item, &product.id).await
            }
            None => {
                let created = self
                    .remote()
                    .create(RESOURCE, &payload)
                    .await
                    .into_result()?;
                let remote_id = remote_id(&created).ok_or("create response has no id")?;
                debug!(sku = %product.sku, remote_id, "Item created");
                self.record_created(EntityType::Item, &product.id, remote_id)
                    .await
            }
        }
    }
}

fn remote_classification(remote: &serde_json::Value) -> Option<(i64, i64)> {
    Some((
        remote_id_field(remote, "majorGroupId")?,
        remote_id_field(remote, "subGroupId")?,
    ))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::api::ApiResponse;
    use crate::testing::FakeApi;
    use infoplus_core::{EntityType, ItemResult, SyncKind};
    use reqwest::Method;
    use serde_json::json;

    #[tokio::test]
    async fn test_new_product_is_created_and_mapped() {
        let api = FakeApi::new()
            .on_get(|_, _| Ok(json!([])))
            .on_request(|_, _, _| ApiResponse::Success(json!({"id": 77})));
        let (engine, db) = engine(api.clone()).await;
        db.products().insert(&product("p1", "ABC123")).await.unwrap();

        let outcome = engine.run(SyncKind::Products).await;

        assert_eq!(outcome.results(), &[ItemResult::ok("ABC123")]);
        assert_eq!(
            db.id_mappings()
                .get_remote_id(EntityType::Item, "p1")
                .await
                .unwrap(),
            Some(77)
        );

        let requests = api.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::POST);
        assert_eq!(requests[0].endpoint, "item");
        let body = requests[0].body.as_ref().unwrap();
        assert_eq!(body["sku"], "ABC123");
        assert_eq!(body["lobId"], 17);
        assert!(body.get("id").is_none());
    }

    #[tokio::test]
    async fn test_existing_item_is_updated_and_drift_fixed() {
        let api = FakeApi::new()
            .on_get(|_, _| Ok(json!([{"id": 90, "sku": "ABC123"}])))
            .on_request(|_, _, body| ApiResponse::Success(body.cloned().unwrap_or_default()));
        let (engine, db) = engine(api.clone()).await;
        db.products().insert(&product("p1", "ABC123")).await.unwrap();
        db.id_mappings()
            .create_or_update_mapping(EntityType::Item, "p1", Some(12))
            .await
            .unwrap();

        let result = engine.sync_product("p1").await.unwrap();
        assert!(result.success, "{result:?}");

        assert_eq!(
            db.id_mappings()
                .get_remote_id(EntityType::Item, "p1")
                .await
                .unwrap(),
            Some(90)
        );
        let requests = api.requests();
        assert_eq!(requests[0].method, Method::PUT);
        assert_eq!(requests[0].body.as_ref().unwrap()["id"], 90);
    }

    #[tokio::test]
    async fn test_classification_backfilled_from_remote() {
        let api = FakeApi::new()
            .on_get(|_, _| Ok(json!([{"id": 5, "majorGroupId": 2, "subGroupId": "9"}])))
            .on_request(|_, _, _| ApiResponse::Success(json!({"id": 5})));
        let (engine, db) = engine(api).await;
        let mut bare = product("p1", "ABC123");
        bare.major_group_id = None;
        bare.sub_group_id = None;
        db.products().insert(&bare).await.unwrap();

        let result = engine.sync_product("p1").await.unwrap();
        assert!(result.success, "{result:?}");

        let stored = db.products().get_by_id("p1").await.unwrap().unwrap();
        assert_eq!(stored.classification(), Some((2, 9)));
    }

    #[tokio::test]
    async fn test_missing_classification_fails_item_without_writes() {
        let api = FakeApi::new().on_get(|_, _| Ok(json!([])));
        let (engine, db) = engine(api.clone()).await;
        let mut bare = product("p1", "ABC123");
        bare.major_group_id = None;
        db.products().insert(&bare).await.unwrap();

        let result = engine.sync_product("p1").await.unwrap();
        assert!(!result.success);
        assert!(result.error.unwrap().contains("ABC123"));
        assert_eq!(api.write_count(), 0);
    }

    #[tokio::test]
    async fn test_lookup_failure_is_not_a_create() {
        let api = FakeApi::new().on_get(|_, _| Err("HTTP 503".to_string()));
        let (engine, db) = engine(api.clone()).await;
        db.products().insert(&product("p1", "ABC123")).await.unwrap();

        let outcome = engine.run(SyncKind::Products).await;
        assert_eq!(outcome.failure_count(), 1);
        assert_eq!(api.write_count(), 0);
    }

    #[tokio::test]
    async fn test_rejected_create_is_recorded_and_batch_continues() {
        let api = FakeApi::new().on_request(|_, _, body| {
            match body.and_then(|b| b["sku"].as_str()) {
                Some("A-1") => ApiResponse::Failure("HTTP 400 from item: bad".into()),
                _ => ApiResponse::Success(json!({"id": 3})),
            }
        });
        let (engine, db) = engine(api).await;
        db.products().insert(&product("p1", "A-1")).await.unwrap();
        db.products().insert(&product("p2", "B-2")).await.unwrap();

        let outcome = engine.run(SyncKind::Products).await;
        assert!(!outcome.find("A-1").unwrap().success);
        assert!(outcome.find("B-2").unwrap().success);
        assert_eq!(
            db.id_mappings()
                .get_remote_id(EntityType::Item, "p1")
                .await
                .unwrap(),
            None
        );
    }
}
