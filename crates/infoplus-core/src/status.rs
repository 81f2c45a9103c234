//! # Remote Order Status → Local Action
//!
//! The warehouse reports free-text order statuses. Each maps to a list of
//! local state-machine steps applied in order.
//!
//! ```text
//! ┌──────────────────────────────┬───────────────────────────────────────┐
//! │ remote status (lower-cased)  │ local steps                           │
//! ├──────────────────────────────┼───────────────────────────────────────┤
//! │ shipped                      │ delivery → ship                       │
//! │ cancelled                    │ transaction → cancel, delivery → cancel│
//! │ error                        │ transaction → fail                    │
//! │ pending, unknown, on order,  │ none (reported as success)            │
//! │ processed, back order        │                                       │
//! │ anything else                │ none (reported as failure)            │
//! └──────────────────────────────┴───────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::state::{Machine, Transition};
use crate::PASSIVE_REMOTE_STATUSES;

/// What the reconciler does for one remote order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "status", rename_all = "snake_case")]
pub enum ReconcileAction {
    /// Mark the delivery shipped.
    Ship,
    /// Cancel the transaction, then the delivery.
    Cancel,
    /// Mark the transaction failed.
    Fail,
    /// Known status that needs no local change.
    NoOp,
    /// Status the sync does not understand; carries the raw value.
    Unhandled(String),
}

impl ReconcileAction {
    /// Ordered local transitions for this action.
    pub fn steps(&self) -> &'static [(Machine, Transition)] {
        match self {
            ReconcileAction::Ship => &[(Machine::Delivery, Transition::Ship)],
            ReconcileAction::Cancel => &[
                (Machine::Transaction, Transition::Cancel),
                (Machine::Delivery, Transition::Cancel),
            ],
            ReconcileAction::Fail => &[(Machine::Transaction, Transition::Fail)],
            ReconcileAction::NoOp | ReconcileAction::Unhandled(_) => &[],
        }
    }

    /// True when the action never touches local state.
    pub fn is_passive(&self) -> bool {
        self.steps().is_empty()
    }
}

/// Maps a remote status string to the local action.
///
/// Matching is case-insensitive and ignores surrounding whitespace.
pub fn action_for_remote_status(status: &str) -> ReconcileAction {
    let normalized = status.trim().to_lowercase();
    match normalized.as_str() {
        "shipped" => ReconcileAction::Ship,
        "cancelled" => ReconcileAction::Cancel,
        "error" => ReconcileAction::Fail,
        s if PASSIVE_REMOTE_STATUSES.contains(&s) => ReconcileAction::NoOp,
        _ => ReconcileAction::Unhandled(status.to_string()),
    }
}
