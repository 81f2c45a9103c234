//! Local change events and the jobs they turn into.
//!
//! The host application reports writes as [`LocalEvent`]s. Each event is
//! checked against the per-kind switches and, when enabled, becomes a
//! single-entity [`SyncJob`] for the job queue.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::SyncSettings;
use infoplus_core::SyncKind;

/// A local write the sync should react to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "id", rename_all = "snake_case")]
pub enum LocalEvent {
    ProductWritten(String),
    CustomerWritten(String),
    OrderWritten(String),
    /// The order's transaction moved to paid.
    OrderPaid(String),
}

impl LocalEvent {
    /// The sync kind whose switch governs this event.
    pub fn kind(&self) -> SyncKind {
        match self {
            LocalEvent::ProductWritten(_) => SyncKind::Products,
            LocalEvent::CustomerWritten(_) => SyncKind::Customers,
            LocalEvent::OrderWritten(_) | LocalEvent::OrderPaid(_) => SyncKind::Orders,
        }
    }
}

/// Unit of work for the background queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "job", content = "target", rename_all = "snake_case")]
pub enum SyncJob {
    Product(String),
    Customer(String),
    Order(String),
    /// A full run of one kind.
    Run(SyncKind),
    FullSync,
}

impl fmt::Display for SyncJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncJob::Product(id) => write!(f, "product {id}"),
            SyncJob::Customer(id) => write!(f, "customer {id}"),
            SyncJob::Order(id) => write!(f, "order {id}"),
            SyncJob::Run(kind) => write!(f, "{kind} run"),
            SyncJob::FullSync => write!(f, "full sync"),
        }
    }
}

/// Maps an event to a job, or `None` when its kind is switched off.
pub fn job_for_event(event: &LocalEvent, settings: &SyncSettings) -> Option<SyncJob> {
    if !settings.is_enabled(event.kind()) {
        return None;
    }

    Some(match event {
        LocalEvent::ProductWritten(id) => SyncJob::Product(id.clone()),
        LocalEvent::CustomerWritten(id) => SyncJob::Customer(id.clone()),
        LocalEvent::OrderWritten(id) | LocalEvent::OrderPaid(id) => SyncJob::Order(id.clone()),
    })
}
