//! # infoplus-db: Sync Persistence
//!
//! SQLite storage for the InfoPlus sync engine: the id mapping and order
//! sync bookkeeping tables, the local catalog/customer/order data the engine
//! reads, and the run records that replace a global "sync in progress" flag.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        InfoPlus Sync Data Flow                          │
//! │                                                                         │
//! │  EntitySyncEngine / OrderStatusReconciler (infoplus-sync)              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   infoplus-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────────┐  ┌────────────┐  │   │
//! │  │   │   Database    │    │   Repositories     │  │ Migrations │  │   │
//! │  │   │   (pool.rs)   │    │                    │  │ (embedded) │  │   │
//! │  │   │               │    │ IdMappingRepo      │  │            │  │   │
//! │  │   │ SqlitePool    │◄───│ OrderSyncRepo      │  │ 001_init   │  │   │
//! │  │   │               │    │ Category/Product/  │  │            │  │   │
//! │  │   │               │    │ Customer/OrderRepo │  │            │  │   │
//! │  │   │               │    │ SyncRunRepo        │  │            │  │   │
//! │  │   └───────────────┘    └────────────────────┘  └────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use infoplus_db::{Database, DbConfig};
//! use infoplus_core::EntityType;
//!
//! let db = Database::new(DbConfig::new("sync.db")).await?;
//! let remote = db.id_mappings().get_remote_id(EntityType::Item, "p-1").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::category::CategoryRepository;
pub use repository::customer::CustomerRepository;
pub use repository::id_mapping::IdMappingRepository;
pub use repository::order::OrderRepository;
pub use repository::order_sync::OrderSyncRepository;
pub use repository::product::ProductRepository;
pub use repository::sync_run::SyncRunRepository;
