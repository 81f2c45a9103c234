//! # infoplus-core: Pure Sync Rules
//!
//! Everything the sync engine decides without touching the network or the
//! database lives here: entity kinds, local entity models, the local order
//! state machine, the remote-status action table, country naming and the
//! JSON payloads the InfoPlus API expects.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        InfoPlus Sync Architecture                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               sync-daemon (events, schedule, CLI)               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │     infoplus-sync (client, limiter, engine, reconciler)         │   │
//! │  └───────────────┬─────────────────────────────┬───────────────────┘   │
//! │                  │                             │                        │
//! │  ┌───────────────▼──────────────┐  ┌───────────▼───────────────────┐   │
//! │  │  ★ infoplus-core (HERE) ★    │  │  infoplus-db (SQLite)         │   │
//! │  │  types • state • status      │◄─│  id_mapping • order_sync      │   │
//! │  │  country • carrier • payload │  │  local catalog / orders       │   │
//! │  └──────────────────────────────┘  └───────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entity kinds, id mappings, order sync records, local entities
//! - [`state`] - Local order/delivery/transaction state machines
//! - [`status`] - Remote order status → local action table
//! - [`country`] - ISO country/state code → InfoPlus naming
//! - [`carrier`] - Truck/package carrier resolution
//! - [`payload`] - JSON bodies sent to InfoPlus
//! - [`result`] - Per-item and per-operation sync results
//! - [`validation`] - Natural key validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use infoplus_core::country::{map_country, map_us_state};
//! use infoplus_core::status::{action_for_remote_status, ReconcileAction};
//!
//! assert_eq!(map_country("us"), "UNITED STATES");
//! assert_eq!(map_us_state("UNITED STATES", "CA"), "California");
//! assert_eq!(action_for_remote_status("Shipped"), ReconcileAction::Ship);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod carrier;
pub mod country;
pub mod error;
pub mod payload;
pub mod result;
pub mod state;
pub mod status;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use result::{ItemResult, SyncOutcome};
pub use state::{DeliveryState, Machine, OrderState, TransactionState, Transition};
pub use status::ReconcileAction;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Remote statuses that are acknowledged without any local change.
pub const PASSIVE_REMOTE_STATUSES: &[&str] =
    &["pending", "unknown", "on order", "processed", "back order"];

/// Default page size for InfoPlus search endpoints.
pub const DEFAULT_PAGE_SIZE: u32 = 250;
