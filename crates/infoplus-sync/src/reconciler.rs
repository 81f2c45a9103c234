//! # Order Status Reconciler
//!
//! Pulls warehouse status for orders that were pushed but have not shipped
//! yet, and walks the local state machines to match.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │  order_sync (shipping = open, payment = paid)                        │
//! │        │                                                             │
//! │        ▼  orderNo batches of 50                                      │
//! │  order/search ──► status ──► ReconcileAction                         │
//! │                                  │                                   │
//! │        ┌────────────┬────────────┼─────────────┬──────────────┐      │
//! │        ▼            ▼            ▼             ▼              ▼      │
//! │      Ship        Cancel        Fail          NoOp        Unhandled   │
//! │   delivery →   transaction →  transaction →  success      failure    │
//! │   shipped      delivery →     failed                                 │
//! │                cancelled                                             │
//! │        │            │            │                                   │
//! │        └────────────┴────────────┴──► order_sync updated             │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every order is reported on its own; one bad order never stops the batch.
//! Orders that the warehouse does not return are left for the next tick.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::api::InfoplusApi;
use crate::endpoints::Endpoints;
use crate::error::SyncResult;
use infoplus_core::payload::RemoteOrder;
use infoplus_core::status::{action_for_remote_status, ReconcileAction};
use infoplus_core::{DeliveryState, ItemResult, OrderSyncRecord, SyncOutcome};
use infoplus_db::Database;

/// Applies remote order status to local orders.
pub struct OrderStatusReconciler {
    db: Database,
    api: Arc<dyn InfoplusApi>,
}

impl OrderStatusReconciler {
    pub fn new(db: Database, api: Arc<dyn InfoplusApi>) -> Self {
        Self { db, api }
    }

    /// Reconciles every pending-shipment order.
    ///
    /// No pending orders is a completed run with no results.
    pub async fn reconcile(&self) -> SyncResult<SyncOutcome> {
        let pending = self.db.order_sync().get_pending_shipment_orders().await?;
        if pending.is_empty() {
            debug!("No orders awaiting shipment");
            return Ok(SyncOutcome::completed(Vec::new()));
        }

        let order_nos: Vec<i64> = pending.iter().map(|r| r.remote_order_id).collect();
        let remote: HashMap<i64, RemoteOrder> = Endpoints::new(self.api.as_ref())
            .orders_by_numbers(&order_nos)
            .await
            .into_iter()
            .map(|order| (order.order_no, order))
            .collect();

        info!(
            pending = pending.len(),
            returned = remote.len(),
            "Reconciling order status"
        );

        let mut results = Vec::with_capacity(pending.len());
        for record in &pending {
            let Some(order) = remote.get(&record.remote_order_id) else {
                debug!(order_no = record.remote_order_id, "Order not returned by InfoPlus");
                continue;
            };

            let outcome = self.apply(record, order).await;
            results.push(match outcome {
                Ok(()) => ItemResult::ok(&record.local_order_id),
                Err(e) => {
                    warn!(
                        local_order_id = %record.local_order_id,
                        order_no = record.remote_order_id,
                        error = %e,
                        "Order status reconcile failed"
                    );
                    ItemResult::failed(&record.local_order_id, e)
                }
            });
        }

        Ok(SyncOutcome::completed(results))
    }

    async fn apply(&self, record: &OrderSyncRecord, order: &RemoteOrder) -> Result<(), String> {
        let action = action_for_remote_status(&order.status);

        match &action {
            ReconcileAction::Unhandled(status) => {
                return Err(format!("Unhandled status '{status}'"));
            }
            ReconcileAction::NoOp => return Ok(()),
            _ => {}
        }

        let statuses = self
            .db
            .orders()
            .apply_transitions(&record.local_order_id, action.steps())
            .await
            .map_err(|e| e.to_string())?;

        let order_sync = self.db.order_sync();
        let updated = match action {
            ReconcileAction::Ship => order_sync
                .update_shipping_status(
                    &record.local_order_id,
                    record.remote_order_id,
                    DeliveryState::Shipped,
                )
                .await
                .map_err(|e| e.to_string())?,
            _ => {
                order_sync
                    .update_order_sync_status(&record.local_order_id, record.remote_order_id, statuses)
                    .await
                    .map_err(|e| e.to_string())?;
                true
            }
        };

        if updated {
            debug!(
                local_order_id = %record.local_order_id,
                status = %order.status,
                %statuses,
                "Order status applied"
            );
        }
        Ok(())
    }
}
