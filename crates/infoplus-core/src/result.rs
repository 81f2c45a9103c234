//! # Sync Results
//!
//! Expected failures are values, not errors. Each entity processed yields an
//! [`ItemResult`]; a whole operation yields a [`SyncOutcome`] that is either
//! the per-item list or a single precondition failure.
//!
//! ```text
//! SyncOutcome::Completed { results: [ItemResult { key, success, error }, ..] }
//! SyncOutcome::Error     { error: "Product sync is disabled" }
//! ```

use serde::{Deserialize, Serialize};

/// Result for one processed entity, keyed by its natural key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemResult {
    /// SKU, customer number, order number or category name.
    pub key: String,
    pub success: bool,
    pub error: Option<String>,
}

impl ItemResult {
    pub fn ok(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            success: true,
            error: None,
        }
    }

    pub fn failed(key: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Outcome of one sync operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// The batch ran; individual items may still have failed.
    Completed { results: Vec<ItemResult> },
    /// A precondition stopped the batch before any item was processed.
    Error { error: String },
}

impl SyncOutcome {
    pub fn completed(results: Vec<ItemResult>) -> Self {
        SyncOutcome::Completed { results }
    }

    pub fn error(error: impl Into<String>) -> Self {
        SyncOutcome::Error {
            error: error.into(),
        }
    }

    /// Per-item results, empty for a precondition failure.
    pub fn results(&self) -> &[ItemResult] {
        match self {
            SyncOutcome::Completed { results } => results,
            SyncOutcome::Error { .. } => &[],
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SyncOutcome::Error { .. })
    }

    pub fn success_count(&self) -> usize {
        self.results().iter().filter(|r| r.success).count()
    }

    pub fn failure_count(&self) -> usize {
        self.results().iter().filter(|r| !r.success).count()
    }

    /// Result for a given key, if it was processed.
    pub fn find(&self, key: &str) -> Option<&ItemResult> {
        self.results().iter().find(|r| r.key == key)
    }
}
