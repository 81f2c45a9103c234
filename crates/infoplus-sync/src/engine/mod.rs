//! # Entity Sync Engine
//!
//! One reconciliation routine per entity kind. Every routine walks its
//! local records one at a time and makes the same decision:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Per-Item Decision                                 │
//! │                                                                         │
//! │   local record                                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │   lookup by natural key (sku, customerNo, customerOrderNo, name)        │
//! │       │                                                                 │
//! │       ├── Failed ───► ItemResult::failed, next item                     │
//! │       │                                                                 │
//! │       ├── Found ────► fix mapping drift ─► PUT ─► touch mapping         │
//! │       │                                                                 │
//! │       └── NotFound ─► POST ─► persist mapping with returned id          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each operation is wrapped in a run record. A precondition failure
//! (kind disabled, nothing to sync, run already open) yields
//! [`SyncOutcome::Error`]; per-item failures land in the result list.

mod category;
mod customer;
mod inventory;
mod order;
mod product;

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::api::InfoplusApi;
use crate::config::SyncConfig;
use crate::endpoints::Endpoints;
use crate::error::SyncResult;
use crate::reconciler::OrderStatusReconciler;
use infoplus_core::{EntityType, ItemResult, RunStatus, SyncKind, SyncOutcome};
use infoplus_db::{Database, DbError};

/// Per-item result while the item is being processed. The error string
/// ends up in [`ItemResult::error`].
type ItemOutcome = Result<(), String>;

/// Kinds run by [`SyncEngine::full_sync`], in dependency order.
pub const FULL_SYNC_ORDER: [SyncKind; 5] = [
    SyncKind::Categories,
    SyncKind::Customers,
    SyncKind::Products,
    SyncKind::Inventory,
    SyncKind::Orders,
];

/// Outcome of every kind in a full sync.
#[derive(Debug, Clone, Serialize)]
pub struct FullSyncReport {
    pub outcomes: Vec<(SyncKind, SyncOutcome)>,
}

impl FullSyncReport {
    pub fn get(&self, kind: SyncKind) -> Option<&SyncOutcome> {
        self.outcomes
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, outcome)| outcome)
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes
            .iter()
            .map(|(_, o)| if o.is_error() { 1 } else { o.failure_count() })
            .sum()
    }
}

/// Reconciles local entities against InfoPlus.
#[derive(Clone)]
pub struct SyncEngine {
    db: Database,
    api: Arc<dyn InfoplusApi>,
    config: Arc<SyncConfig>,
}

impl SyncEngine {
    pub fn new(db: Database, api: Arc<dyn InfoplusApi>, config: Arc<SyncConfig>) -> Self {
        SyncEngine { db, api, config }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub(crate) fn remote(&self) -> Endpoints<'_> {
        Endpoints::new(self.api.as_ref())
    }

    pub(crate) fn lob_id(&self) -> i64 {
        self.api.lob_id()
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Runs one sync operation inside a run record.
    pub async fn run(&self, kind: SyncKind) -> SyncOutcome {
        let stale_after = self.config.sync.stale_run_after();
        let run = match self.db.sync_runs().start(kind, stale_after).await {
            Ok(run) => run,
            Err(DbError::RunInProgress { run_id, .. }) => {
                warn!(kind = %kind, run_id = %run_id, "Sync already running");
                return SyncOutcome::error(format!("{} sync is already running", label(kind)));
            }
            Err(e) => {
                error!(kind = %kind, error = %e, "Failed to open run record");
                return SyncOutcome::error(e.to_string());
            }
        };

        info!(kind = %kind, run_id = %run.id, "Sync started");

        let outcome = match self.execute(kind).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(kind = %kind, error = %e, "Sync aborted");
                SyncOutcome::error(e.to_string())
            }
        };

        let (status, error) = match &outcome {
            SyncOutcome::Error { error } => (RunStatus::Failed, Some(error.as_str())),
            SyncOutcome::Completed { .. } => (RunStatus::Completed, None),
        };

        if let Err(e) = self
            .db
            .sync_runs()
            .finish(
                &run.id,
                status,
                outcome.success_count() as i64,
                outcome.failure_count() as i64,
                error,
            )
            .await
        {
            error!(run_id = %run.id, error = %e, "Failed to close run record");
        }

        info!(
            kind = %kind,
            run_id = %run.id,
            succeeded = outcome.success_count(),
            failed = outcome.failure_count(),
            "Sync finished"
        );
        outcome
    }

    async fn execute(&self, kind: SyncKind) -> SyncResult<SyncOutcome> {
        if !self.config.is_enabled(kind) {
            return Ok(SyncOutcome::error(format!("{} sync is disabled", label(kind))));
        }

        match kind {
            SyncKind::Categories => self.sync_categories().await,
            SyncKind::Customers => self.sync_customers().await,
            SyncKind::Products => self.sync_products().await,
            SyncKind::Orders => self.sync_orders().await,
            SyncKind::Inventory => self.sync_inventory().await,
            SyncKind::OrderStatus => {
                OrderStatusReconciler::new(self.db.clone(), self.api.clone())
                    .reconcile()
                    .await
            }
        }
    }

    /// Runs every enabled kind in dependency order.
    pub async fn full_sync(&self) -> FullSyncReport {
        let mut outcomes = Vec::new();

        for kind in FULL_SYNC_ORDER {
            if !self.config.is_enabled(kind) {
                debug!(kind = %kind, "Skipping disabled kind");
                continue;
            }
            outcomes.push((kind, self.run(kind).await));
        }

        FullSyncReport { outcomes }
    }

    // =========================================================================
    // Mapping Helpers
    // =========================================================================

    /// Points the mapping for `local_id` at `remote_id`, rewriting it on
    /// drift and adopting unmapped remote records.
    pub(crate) async fn align_mapping(
        &self,
        entity_type: EntityType,
        local_id: &str,
        remote_id: i64,
    ) -> ItemOutcome {
        let mappings = self.db.id_mappings();
        let current = mappings
            .get_remote_id(entity_type, local_id)
            .await
            .map_err(|e| e.to_string())?;

        match current {
            Some(mapped) if mapped == remote_id => return Ok(()),
            Some(mapped) => warn!(
                entity_type = %entity_type,
                local_id = %local_id,
                mapped,
                remote_id,
                "Mapping drift, rewriting"
            ),
            None => debug!(
                entity_type = %entity_type,
                local_id = %local_id,
                remote_id,
                "Adopting existing remote record"
            ),
        }

        mappings
            .create_or_update_mapping(entity_type, local_id, Some(remote_id))
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    /// Marks a mapping as confirmed by a successful update.
    pub(crate) async fn touch_mapping(&self, entity_type: EntityType, local_id: &str) -> ItemOutcome {
        self.db
            .id_mappings()
            .touch_updated_at(entity_type, local_id)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    /// Stores the id InfoPlus assigned on create.
    pub(crate) async fn record_created(
        &self,
        entity_type: EntityType,
        local_id: &str,
        remote_id: i64,
    ) -> ItemOutcome {
        self.db
            .id_mappings()
            .create_or_update_mapping(entity_type, local_id, Some(remote_id))
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

/// Folds a per-item outcome into its reported result.
pub(crate) fn item_result(kind: SyncKind, key: &str, outcome: ItemOutcome) -> ItemResult {
    match outcome {
        Ok(()) => ItemResult::ok(key),
        Err(error) => {
            warn!(kind = %kind, key = %key, error = %error, "Item sync failed");
            ItemResult::failed(key, error)
        }
    }
}

fn label(kind: SyncKind) -> &'static str {
    match kind {
        SyncKind::Categories => "Category",
        SyncKind::Customers => "Customer",
        SyncKind::Products => "Product",
        SyncKind::Orders => "Order",
        SyncKind::Inventory => "Inventory",
        SyncKind::OrderStatus => "Order status",
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::testing::FakeApi;
    use chrono::Utc;
    use infoplus_core::{
        Address, Customer, DeliveryState, Order, OrderLineItem, OrderState, Product,
        TransactionState,
    };
    use infoplus_db::DbConfig;

    pub fn config() -> SyncConfig {
        let mut config = SyncConfig::default();
        config.api.api_key = "secret".into();
        config.api.domain = "acme".into();
        config.api.lob_id = 17;
        config.api.warehouse_id = 3;
        config.api.default_carrier_id = 1;
        config.sync.customer_write_pause_ms = 0;
        config
    }

    pub async fn engine_with(api: FakeApi, config: SyncConfig) -> (SyncEngine, Database) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let engine = SyncEngine::new(db.clone(), Arc::new(api), Arc::new(config));
        (engine, db)
    }

    pub async fn engine(api: FakeApi) -> (SyncEngine, Database) {
        engine_with(api, config()).await
    }

    pub fn product(id: &str, sku: &str) -> Product {
        Product {
            id: id.to_string(),
            sku: sku.to_string(),
            name: format!("Product {sku}"),
            description: None,
            ean: None,
            weight_kg: Some(1.25),
            category_id: None,
            major_group_id: Some(4),
            sub_group_id: Some(8),
            stock: 0,
            active: true,
            updated_at: Utc::now(),
        }
    }

    pub fn customer(id: &str, number: &str) -> Customer {
        Customer {
            id: id.to_string(),
            customer_number: number.to_string(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            company: None,
            email: "ada@example.com".into(),
            phone: None,
            address: Address {
                street: "1 Main St".into(),
                additional_address: None,
                city: "Springfield".into(),
                zip_code: "62701".into(),
                country_iso: "US".into(),
                state_code: Some("IL".into()),
            },
            updated_at: Utc::now(),
        }
    }

    pub fn order(id: &str, customer_id: &str) -> Order {
        Order {
            id: id.to_string(),
            order_number: format!("SO-{id}"),
            customer_id: customer_id.to_string(),
            customer_number: String::new(),
            order_date: Utc::now(),
            order_state: OrderState::Open,
            delivery_state: DeliveryState::Open,
            transaction_state: TransactionState::Paid,
            shipping_first_name: "Ada".into(),
            shipping_last_name: "Lovelace".into(),
            shipping_company: None,
            email: "ada@example.com".into(),
            phone: None,
            address: Address {
                street: "1 Main St".into(),
                additional_address: None,
                city: "Springfield".into(),
                zip_code: "62701".into(),
                country_iso: "US".into(),
                state_code: Some("IL".into()),
            },
            line_items: vec![OrderLineItem {
                product_id: "p1".into(),
                sku: "ABC123".into(),
                quantity: 2,
                unit_price_cents: 1999,
            }],
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::api::ApiResponse;
    use crate::testing::FakeApi;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn test_disabled_kind_is_a_precondition_error() {
        let mut config = config();
        config.sync.inventory = false;
        let (engine, db) = engine_with(FakeApi::new(), config).await;

        let outcome = engine.run(SyncKind::Inventory).await;
        assert_eq!(outcome, SyncOutcome::error("Inventory sync is disabled"));

        let runs = db.sync_runs().recent(5).await.unwrap();
        assert_eq!(runs[0].status, RunStatus::Failed);
        assert_eq!(runs[0].error.as_deref(), Some("Inventory sync is disabled"));
    }

    #[tokio::test]
    async fn test_open_run_blocks_second_run() {
        let (engine, db) = engine(FakeApi::new()).await;
        db.sync_runs()
            .start(SyncKind::Products, Duration::from_secs(3600))
            .await
            .unwrap();

        let outcome = engine.run(SyncKind::Products).await;
        assert_eq!(outcome, SyncOutcome::error("Product sync is already running"));
    }

    #[tokio::test]
    async fn test_run_records_counts() {
        let api = FakeApi::new().on_request(|_, _, _| ApiResponse::Success(json!({"id": 5})));
        let (engine, db) = engine(api).await;
        db.products().insert(&product("p1", "A-1")).await.unwrap();
        let mut unclassified = product("p2", "B-2");
        unclassified.major_group_id = None;
        db.products().insert(&unclassified).await.unwrap();

        let outcome = engine.run(SyncKind::Products).await;
        assert_eq!(outcome.success_count(), 1);
        assert_eq!(outcome.failure_count(), 1);

        let runs = db.sync_runs().recent(1).await.unwrap();
        let run = &runs[0];
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!((run.success_count, run.failure_count), (1, 1));
    }

    #[tokio::test]
    async fn test_full_sync_skips_disabled_kinds() {
        let mut config = config();
        config.sync.orders = false;
        config.sync.inventory = false;
        let (engine, _) = engine_with(FakeApi::new(), config).await;

        let report = engine.full_sync().await;
        let kinds: Vec<_> = report.outcomes.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            kinds,
            vec![SyncKind::Categories, SyncKind::Customers, SyncKind::Products]
        );
        assert_eq!(
            report.get(SyncKind::Customers),
            Some(&SyncOutcome::error("No customers to sync"))
        );
    }
}
