//! Customer → `customer` sync, keyed by customer number.
//!
//! Carriers are resolved once per run from the remote carrier list. Each
//! write is followed by a short pause to stay clear of the remote's
//! customer write throttle.

use tracing::{debug, info};

use super::{item_result, ItemOutcome, SyncEngine};
use crate::endpoints::Lookup;
use crate::error::SyncResult;
use infoplus_core::carrier::{resolve_carriers, CarrierIds};
use infoplus_core::payload::{remote_id, CustomerPayload};
use infoplus_core::validation::validate_customer_number;
use infoplus_core::{Customer, EntityType, ItemResult, SyncKind, SyncOutcome};

const RESOURCE: &str = "customer";

impl SyncEngine {
    pub(crate) async fn sync_customers(&self) -> SyncResult<SyncOutcome> {
        let customers = self.db.customers().list_for_sync().await?;
        if customers.is_empty() {
            return Ok(SyncOutcome::error("No customers to sync"));
        }

        let carriers = self.resolve_carriers().await;
        info!(count = customers.len(), ?carriers, "Syncing customers");

        let mut results = Vec::with_capacity(customers.len());
        for customer in &customers {
            results.push(self.push_customer(customer, carriers).await);
        }

        Ok(SyncOutcome::completed(results))
    }

    /// Syncs one customer by local id.
    pub async fn sync_customer(&self, customer_id: &str) -> SyncResult<ItemResult> {
        let Some(customer) = self.db.customers().get_by_id(customer_id).await? else {
            return Ok(ItemResult::failed(customer_id, "customer not found"));
        };
        let carriers = self.resolve_carriers().await;
        Ok(self.push_customer(&customer, carriers).await)
    }

    async fn resolve_carriers(&self) -> CarrierIds {
        let carriers = self.remote().carriers().await;
        resolve_carriers(&carriers, self.config.api.default_carrier_id)
    }

    async fn push_customer(&self, customer: &Customer, carriers: CarrierIds) -> ItemResult {
        let outcome = self.try_push_customer(customer, carriers).await;
        item_result(SyncKind::Customers, &customer.customer_number, outcome)
    }

    async fn try_push_customer(&self, customer: &Customer, carriers: CarrierIds) -> ItemOutcome {
        validate_customer_number(&customer.customer_number).map_err(|e| e.to_string())?;

        let payload = CustomerPayload::from_customer(customer, self.lob_id(), carriers);

        match self.remote().find_customer(&customer.customer_number).await {
            Lookup::Failed(e) => Err(format!("customer lookup failed: {e}")),
            Lookup::Found(remote) => {
                let remote_id = remote_id(&remote).ok_or("remote customer has no id")?;
                self.align_mapping(EntityType::Customer, &customer.id, remote_id)
                    .await?;
                let response = self
                    .remote()
                    .update(RESOURCE, &payload.with_id(remote_id))
                    .await;
                self.pause_after_write().await;
                response.into_result()?;
                self.touch_mapping(EntityType::Customer, &customer.id).await
            }
            Lookup::NotFound => {
                let response = self.remote().create(RESOURCE, &payload).await;
                self.pause_after_write().await;
                let created = response.into_result()?;
                let remote_id = remote_id(&created).ok_or("create response has no id")?;
                debug!(customer_number = %customer.customer_number, remote_id, "Customer created");
                self.record_created(EntityType::Customer, &customer.id, remote_id)
                    .await
            }
        }
    }

    async fn pause_after_write(&self) {
        let pause = self.config.sync.customer_write_pause();
        if !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::api::ApiResponse;
    use crate::testing::FakeApi;
    use infoplus_core::{EntityType, SyncKind};
    use reqwest::Method;
    use serde_json::json;
    use std::time::Duration;
    use std::time::Instant;

    fn carrier_api() -> FakeApi {
        FakeApi::new().on_get(|endpoint, _| match endpoint {
            "carrier/search" => Ok(json!([
                {"carrier": 1, "label": "UPS Ground"},
                {"carrier": 120, "label": "Freight TRUCK"}
            ])),
            _ => Ok(json!([])),
        })
    }

    #[tokio::test]
    async fn test_customer_created_with_resolved_carriers() {
        let api = carrier_api().on_request(|_, _, _| ApiResponse::Success(json!({"id": 501})));
        let (engine, db) = engine(api.clone()).await;
        db.customers().insert(&customer("c1", "10001")).await.unwrap();

        let outcome = engine.run(SyncKind::Customers).await;
        assert!(outcome.find("10001").unwrap().success);

        let body = api.requests()[0].body.clone().unwrap();
        assert_eq!(body["truckCarrierId"], 120);
        assert_eq!(body["packageCarrierId"], 1);
        assert_eq!(body["country"], "UNITED STATES");
        assert_eq!(body["state"], "Illinois");

        assert_eq!(
            db.id_mappings()
                .get_remote_id(EntityType::Customer, "c1")
                .await
                .unwrap(),
            Some(501)
        );
    }

    #[tokio::test]
    async fn test_carrier_fallbacks_when_list_unavailable() {
        let api = FakeApi::new()
            .on_get(|endpoint, _| match endpoint {
                "carrier/search" => Err("HTTP 500".into()),
                _ => Ok(json!([{"id": 9, "customerNo": "10001"}])),
            })
            .on_request(|_, _, _| ApiResponse::Success(json!({})));
        let (engine, db) = engine(api.clone()).await;
        db.customers().insert(&customer("c1", "10001")).await.unwrap();

        let result = engine.sync_customer("c1").await.unwrap();
        assert!(result.success, "{result:?}");

        let requests = api.requests();
        let request = &requests[0];
        assert_eq!(request.method, Method::PUT);
        let body = request.body.as_ref().unwrap();
        assert_eq!(body["id"], 9);
        assert_eq!(body["truckCarrierId"], 100);
        assert_eq!(body["packageCarrierId"], 0);
    }

    #[tokio::test]
    async fn test_pauses_after_each_write() {
        let api = carrier_api().on_request(|_, _, _| ApiResponse::Success(json!({"id": 1})));
        let mut config = config();
        config.sync.customer_write_pause_ms = 60;
        let (engine, db) = engine_with(api, config).await;
        db.customers().insert(&customer("c1", "10001")).await.unwrap();
        db.customers().insert(&customer("c2", "10002")).await.unwrap();

        let started = Instant::now();
        let outcome = engine.run(SyncKind::Customers).await;
        assert_eq!(outcome.success_count(), 2);
        assert!(started.elapsed() >= Duration::from_millis(120));
    }
}
