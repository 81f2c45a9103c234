//! # infoplus-sync: Sync Engine for the InfoPlus WMS
//!
//! Pushes local categories, customers, products and paid orders to
//! InfoPlus, pulls warehouse inventory and order status back, and keeps
//! the local ↔ remote id mappings straight in between.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sync Architecture                                │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                  SyncAgent (Main Orchestrator)                   │  │
//! │  │  job worker + periodic order status reconciliation               │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │  JobWorker     │  │  SyncEngine    │  │ OrderStatusReconciler  │    │
//! │  │                │  │                │  │                        │    │
//! │  │ LocalEvent →   │─►│ one routine    │  │ remote status →        │    │
//! │  │ SyncJob, one   │  │ per entity     │  │ local state machines   │    │
//! │  │ at a time      │  │ kind           │  │                        │    │
//! │  └────────────────┘  └───────┬────────┘  └───────────┬────────────┘    │
//! │                              │                       │                  │
//! │                              ▼                       ▼                  │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Endpoints → InfoplusApi (HttpClient)                            │  │
//! │  │  identity + domain token buckets, retry with backoff, API-Key    │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`agent`] - `SyncAgent` orchestrator and its handle
//! - [`api`] - `InfoplusApi` trait, paging and filter helpers
//! - [`client`] - reqwest-backed `HttpClient`
//! - [`config`] - TOML + env configuration
//! - [`endpoints`] - typed remote lookups and writes
//! - [`engine`] - per-kind sync routines and full sync
//! - [`error`] - sync error types
//! - [`events`] - local events and the jobs they map to
//! - [`jobs`] - bounded job queue and worker
//! - [`rate_limit`] - token buckets
//! - [`reconciler`] - order status reconciliation
//! - [`retry`] - exponential backoff policy
//!
//! ## Usage
//!
//! ```rust,ignore
//! use infoplus_sync::{HttpClient, SyncAgent, SyncConfig, SyncEngine};
//!
//! let config = Arc::new(SyncConfig::load_or_default(None));
//! let api = Arc::new(HttpClient::new(&config)?);
//! let engine = SyncEngine::new(database, api, config);
//!
//! let report = engine.full_sync().await;
//! let agent = SyncAgent::new(engine).start();
//! agent.notify(&LocalEvent::OrderPaid(order_id))?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod agent;
pub mod api;
pub mod client;
pub mod config;
pub mod endpoints;
pub mod engine;
pub mod error;
pub mod events;
pub mod jobs;
pub mod rate_limit;
pub mod reconciler;
pub mod retry;

#[cfg(test)]
mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use agent::{AgentStatus, SyncAgent, SyncAgentHandle};
pub use api::{ApiResponse, InfoplusApi};
pub use client::HttpClient;
pub use config::{ApiSettings, RateLimitSettings, SyncConfig, SyncSettings};
pub use engine::{FullSyncReport, SyncEngine, FULL_SYNC_ORDER};
pub use error::{SyncError, SyncResult};
pub use events::{LocalEvent, SyncJob};
pub use jobs::{JobQueueHandle, JobReport, JobWorker};
pub use reconciler::OrderStatusReconciler;
pub use retry::RetryPolicy;
