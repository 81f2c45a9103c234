//! # Repository Module
//!
//! Database repository implementations for the sync engine.
//!
//! ## Who Writes What
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  table             written by                     read by               │
//! │  ───────────────   ────────────────────────────   ───────────────────   │
//! │  id_mapping        engine (create/update/touch)   engine                │
//! │  order_sync        engine, reconciler             engine, reconciler    │
//! │  sync_runs         every sync operation           daemon `status`       │
//! │  categories        category sync (seed, ids)      category/product sync │
//! │  products          inventory pull, backfill       product/inventory     │
//! │  customers         storefront                     customer/order sync   │
//! │  orders            storefront, reconciler         order sync            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`IdMappingRepository`](id_mapping::IdMappingRepository) - local ↔ remote id mappings
//! - [`OrderSyncRepository`](order_sync::OrderSyncRepository) - last reconciled status triples
//! - [`CategoryRepository`](category::CategoryRepository) - remote category tree mirror
//! - [`ProductRepository`](product::ProductRepository) - products, classification, stock
//! - [`CustomerRepository`](customer::CustomerRepository) - customers
//! - [`OrderRepository`](order::OrderRepository) - orders, line items, state transitions
//! - [`SyncRunRepository`](sync_run::SyncRunRepository) - run records

pub mod category;
pub mod customer;
pub mod id_mapping;
pub mod order;
pub mod order_sync;
pub mod product;
pub mod sync_run;
