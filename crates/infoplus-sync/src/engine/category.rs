//! Category and subcategory sync.
//!
//! On the first run with no local rows the full remote catalog of both
//! levels is imported. After that the sync is one-way: local names go out,
//! the remote `internalId` comes back.

use tracing::{debug, info};

use super::{item_result, ItemOutcome, SyncEngine};
use crate::endpoints::Lookup;
use crate::error::SyncResult;
use infoplus_core::payload::{CategoryPayload, RemoteCategory};
use infoplus_core::{CategoryKind, ItemResult, LocalCategory, SyncKind, SyncOutcome};
use infoplus_db::repository::category::generate_category_id;

impl SyncEngine {
    pub(crate) async fn sync_categories(&self) -> SyncResult<SyncOutcome> {
        if self.db.categories().count().await? == 0 {
            self.seed_categories().await?;
        }

        let categories = self.db.categories().list().await?;
        if categories.is_empty() {
            return Ok(SyncOutcome::error("No categories to sync"));
        }

        info!(count = categories.len(), "Syncing categories");

        let mut results = Vec::with_capacity(categories.len());
        for category in &categories {
            results.push(self.push_category(category).await);
        }

        Ok(SyncOutcome::completed(results))
    }

    /// Imports both remote category levels into an empty local table.
    async fn seed_categories(&self) -> SyncResult<usize> {
        let mut seeded = Vec::new();

        for kind in [CategoryKind::Category, CategoryKind::SubCategory] {
            let remote = self.remote().categories(kind).await;
            seeded.extend(
                remote
                    .iter()
                    .filter_map(RemoteCategory::from_value)
                    .map(|rc| LocalCategory {
                        id: generate_category_id(),
                        remote_id_raw: Some(rc.id),
                        internal_id: rc.internal_id,
                        name: rc.name,
                        is_sub_category: kind.is_sub_category(),
                    }),
            );
        }

        if seeded.is_empty() {
            debug!("Remote category catalog is empty, nothing to seed");
            return Ok(0);
        }

        let count = self.db.categories().insert_many(&seeded).await?;
        for category in &seeded {
            if let Some(internal_id) = category.internal_id {
                self.db
                    .id_mappings()
                    .create_or_update_mapping(category.kind().entity_type(), &category.id, Some(internal_id))
                    .await?;
            }
        }

        info!(count, "Seeded local categories from InfoPlus");
        Ok(count)
    }

    async fn push_category(&self, category: &LocalCategory) -> ItemResult {
        let outcome = self.try_push_category(category).await;
        item_result(SyncKind::Categories, &category.name, outcome)
    }

    async fn try_push_category(&self, category: &LocalCategory) -> ItemOutcome {
        let kind = category.kind();
        let entity_type = kind.entity_type();
        let lookup = self
            .remote()
            .find_category(kind, category.remote_id_raw.as_deref(), &category.name)
            .await;

        match lookup {
            Lookup::Failed(e) => Err(format!("{} lookup failed: {e}", kind.endpoint())),
            Lookup::Found(remote) => {
                let remote = RemoteCategory::from_value(&remote).ok_or("remote category has no id")?;
                let internal_id = remote
                    .internal_id
                    .ok_or("remote category has no internalId")?;

                let payload = CategoryPayload {
                    internal_id: Some(internal_id),
                    id: remote.id.clone(),
                    ..CategoryPayload::from_category(category, self.lob_id())
                };
                self.remote()
                    .update(kind.endpoint(), &payload)
                    .await
                    .into_result()?;

                if category.remote_id_raw.as_deref() != Some(remote.id.as_str())
                    || category.internal_id != Some(internal_id)
                {
                    debug!(name = %category.name, internal_id, "Pulling back remote ids");
                    self.db
                        .categories()
                        .set_remote_ids(&category.id, &remote.id, internal_id)
                        .await
                        .map_err(|e| e.to_string())?;
                }

                self.align_mapping(entity_type, &category.id, internal_id)
                    .await?;
                self.touch_mapping(entity_type, &category.id).await
            }
            Lookup::NotFound => {
                let payload = CategoryPayload {
                    internal_id: None,
                    ..CategoryPayload::from_category(category, self.lob_id())
                };
                let created = self
                    .remote()
                    .create(kind.endpoint(), &payload)
                    .await
                    .into_result()?;

                let remote = RemoteCategory::from_value(&created);
                let internal_id = remote
                    .as_ref()
                    .and_then(|rc| rc.internal_id)
                    .ok_or("create response has no internalId")?;
                let raw = remote.map(|rc| rc.id).unwrap_or(payload.id);

                self.db
                    .categories()
                    .set_remote_ids(&category.id, &raw, internal_id)
                    .await
                    .map_err(|e| e.to_string())?;
                debug!(name = %category.name, internal_id, kind = kind.endpoint(), "Category created");
                self.record_created(entity_type, &category.id, internal_id)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::api::ApiResponse;
    use crate::testing::{query_param, FakeApi};
    use infoplus_core::EntityType;
    use reqwest::Method;
    use serde_json::json;

    #[tokio::test]
    async fn test_first_run_seeds_both_levels() {
        let api = FakeApi::new()
            .on_get(|endpoint, query| {
                let paged = query_param(query, "limit") != "1";
                match (endpoint, paged) {
                    ("itemCategory/search", true) => Ok(json!([
                        {"id": "APP", "internalId": 11, "name": "Apparel"}
                    ])),
                    ("itemSubCategory/search", true) => Ok(json!([
                        {"id": "SHO", "internalId": 21, "name": "Shoes"},
                        {"id": "HAT", "internalId": 22, "name": "Hats"}
                    ])),
                    ("itemCategory/search", false) => {
                        Ok(json!([{"id": "APP", "internalId": 11, "name": "Apparel"}]))
                    }
                    ("itemSubCategory/search", false) => {
                        let filter = query_param(query, "filter");
                        if filter.contains("'SHO'") {
                            Ok(json!([{"id": "SHO", "internalId": 21, "name": "Shoes"}]))
                        } else {
                            Ok(json!([{"id": "HAT", "internalId": 22, "name": "Hats"}]))
                        }
                    }
                    _ => Ok(json!([])),
                }
            })
            .on_request(|_, _, body| ApiResponse::Success(body.cloned().unwrap_or_default()));
        let (engine, db) = engine(api.clone()).await;

        let outcome = engine.run(SyncKind::Categories).await;
        assert_eq!(outcome.success_count(), 3, "{outcome:?}");

        let local = db.categories().list().await.unwrap();
        assert_eq!(local.len(), 3);
        assert_eq!(local.iter().filter(|c| c.is_sub_category).count(), 2);

        let apparel = local.iter().find(|c| c.name == "Apparel").unwrap();
        assert_eq!(
            db.id_mappings()
                .get_remote_id(EntityType::ItemCategory, &apparel.id)
                .await
                .unwrap(),
            Some(11)
        );
        assert!(api.requests().iter().all(|r| r.method == Method::PUT));
    }

    #[tokio::test]
    async fn test_new_local_category_is_created_on_the_right_endpoint() {
        let api = FakeApi::new()
            .on_request(|_, _, _| ApiResponse::Success(json!({"id": "BAGS", "internalId": 40, "name": "Bags"})));
        let (engine, db) = engine(api.clone()).await;
        let bags = LocalCategory {
            id: "cat-1".into(),
            remote_id_raw: None,
            internal_id: None,
            name: "Bags".into(),
            is_sub_category: true,
        };
        db.categories().insert(&bags).await.unwrap();

        let outcome = engine.run(SyncKind::Categories).await;
        assert_eq!(outcome.results(), &[ItemResult::ok("Bags")]);

        let requests = api.requests();
        let request = &requests[0];
        assert_eq!(request.endpoint, "itemSubCategory");
        assert_eq!(request.method, Method::POST);
        assert!(request.body.as_ref().unwrap().get("internalId").is_none());

        let stored = db.categories().get("cat-1").await.unwrap().unwrap();
        assert_eq!(stored.remote_id_raw.as_deref(), Some("BAGS"));
        assert_eq!(stored.internal_id, Some(40));
        assert_eq!(
            db.id_mappings()
                .get_remote_id(EntityType::ItemSubCategory, "cat-1")
                .await
                .unwrap(),
            Some(40)
        );
    }

    #[tokio::test]
    async fn test_empty_remote_and_local_is_precondition_error() {
        let (engine, _) = engine(FakeApi::new()).await;
        assert_eq!(
            engine.run(SyncKind::Categories).await,
            SyncOutcome::error("No categories to sync")
        );
    }
}
