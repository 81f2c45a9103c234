//! Inventory pull: InfoPlus warehouse stock → local product stock.
//!
//! Detail rows are per location, so quantities are summed per SKU before
//! the absolute stock level is written. SKUs with no local product are
//! skipped.

use std::collections::BTreeMap;
use tracing::{debug, info};

use super::{item_result, SyncEngine};
use crate::error::SyncResult;
use infoplus_core::payload::InventoryDetail;
use infoplus_core::{SyncKind, SyncOutcome};

impl SyncEngine {
    pub(crate) async fn sync_inventory(&self) -> SyncResult<SyncOutcome> {
        let warehouse_id = self.config.api.warehouse_id;
        let details = self.remote().inventory_details(warehouse_id).await;
        if details.is_empty() {
            return Ok(SyncOutcome::error(format!(
                "No inventory returned for warehouse {warehouse_id}"
            )));
        }

        let totals = sum_by_sku(&details);
        info!(rows = details.len(), skus = totals.len(), "Syncing inventory");

        let mut results = Vec::with_capacity(totals.len());
        let mut skipped = 0usize;

        for (sku, quantity) in &totals {
            let stock = quantity.max(0.0).floor() as i64;
            match self.db.products().set_stock_by_sku(sku, stock).await {
                Ok(true) => results.push(item_result(SyncKind::Inventory, sku, Ok(()))),
                Ok(false) => {
                    debug!(sku = %sku, "No local product for SKU, skipping");
                    skipped += 1;
                }
                Err(e) => results.push(item_result(SyncKind::Inventory, sku, Err(e.to_string()))),
            }
        }

        if skipped > 0 {
            info!(skipped, "Inventory rows without a local product");
        }

        Ok(SyncOutcome::completed(results))
    }
}

fn sum_by_sku(details: &[InventoryDetail]) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();
    for detail in details {
        let sku = detail.sku.trim();
        if sku.is_empty() {
            continue;
        }
        *totals.entry(sku.to_string()).or_insert(0.0) += detail.quantity;
    }
    totals
}
