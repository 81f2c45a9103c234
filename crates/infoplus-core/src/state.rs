//! # Local Order State Machines
//!
//! A local order carries three independent state machines: the order itself,
//! its delivery and its payment transaction. The reconciler drives delivery
//! and transaction transitions from remote warehouse statuses; the engine
//! reads all three as the status triple used by the idempotence guard.
//!
//! ## Transition Tables
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DELIVERY                                                               │
//! │    ship    : open | shipped_partially            → shipped              │
//! │    cancel  : open | shipped_partially            → cancelled            │
//! │                                                                         │
//! │  TRANSACTION                                                            │
//! │    cancel  : open | authorized | paid | paid_partially → cancelled      │
//! │    fail    : open | authorized | paid             → failed              │
//! │                                                                         │
//! │  ORDER                                                                  │
//! │    cancel  : open | in_progress                   → cancelled           │
//! │    complete: in_progress                          → completed           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Machine & Transition
// =============================================================================

/// Which of the three local state machines a transition targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Machine {
    Order,
    Delivery,
    Transaction,
}

impl fmt::Display for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Machine::Order => write!(f, "order"),
            Machine::Delivery => write!(f, "delivery"),
            Machine::Transaction => write!(f, "transaction"),
        }
    }
}

/// A named transition action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Ship,
    Cancel,
    Fail,
    Complete,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::Ship => write!(f, "ship"),
            Transition::Cancel => write!(f, "cancel"),
            Transition::Fail => write!(f, "fail"),
            Transition::Complete => write!(f, "complete"),
        }
    }
}

fn illegal(machine: Machine, transition: Transition, from: &str) -> CoreError {
    CoreError::IllegalTransition {
        machine,
        transition,
        from: from.to_string(),
    }
}

// =============================================================================
// Order State
// =============================================================================

/// Overall order state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    #[default]
    Open,
    InProgress,
    Completed,
    Cancelled,
}

impl OrderState {
    /// Technical name as persisted.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::Open => "open",
            OrderState::InProgress => "in_progress",
            OrderState::Completed => "completed",
            OrderState::Cancelled => "cancelled",
        }
    }

    /// Applies a transition, returning the target state.
    pub fn apply(self, transition: Transition) -> CoreResult<Self> {
        match (self, transition) {
            (OrderState::Open | OrderState::InProgress, Transition::Cancel) => {
                Ok(OrderState::Cancelled)
            }
            (OrderState::InProgress, Transition::Complete) => Ok(OrderState::Completed),
            _ => Err(illegal(Machine::Order, transition, self.as_str())),
        }
    }
}

impl FromStr for OrderState {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(OrderState::Open),
            "in_progress" => Ok(OrderState::InProgress),
            "completed" => Ok(OrderState::Completed),
            "cancelled" => Ok(OrderState::Cancelled),
            other => Err(CoreError::UnknownState {
                machine: Machine::Order,
                value: other.to_string(),
            }),
        }
    }
}

// =============================================================================
// Delivery State
// =============================================================================

/// Shipping state of an order's delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum DeliveryState {
    #[default]
    Open,
    ShippedPartially,
    Shipped,
    Returned,
    Cancelled,
}

impl DeliveryState {
    /// Technical name as persisted.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryState::Open => "open",
            DeliveryState::ShippedPartially => "shipped_partially",
            DeliveryState::Shipped => "shipped",
            DeliveryState::Returned => "returned",
            DeliveryState::Cancelled => "cancelled",
        }
    }

    /// Applies a transition, returning the target state.
    pub fn apply(self, transition: Transition) -> CoreResult<Self> {
        use DeliveryState::*;
        match (self, transition) {
            (Open | ShippedPartially, Transition::Ship) => Ok(Shipped),
            (Open | ShippedPartially, Transition::Cancel) => Ok(Cancelled),
            _ => Err(illegal(Machine::Delivery, transition, self.as_str())),
        }
    }
}

impl FromStr for DeliveryState {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(DeliveryState::Open),
            "shipped_partially" => Ok(DeliveryState::ShippedPartially),
            "shipped" => Ok(DeliveryState::Shipped),
            "returned" => Ok(DeliveryState::Returned),
            "cancelled" => Ok(DeliveryState::Cancelled),
            other => Err(CoreError::UnknownState {
                machine: Machine::Delivery,
                value: other.to_string(),
            }),
        }
    }
}

// =============================================================================
// Transaction State
// =============================================================================

/// Payment state of an order's transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum TransactionState {
    #[default]
    Open,
    Authorized,
    Paid,
    PaidPartially,
    Failed,
    Cancelled,
    Refunded,
}

impl TransactionState {
    /// Technical name as persisted.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionState::Open => "open",
            TransactionState::Authorized => "authorized",
            TransactionState::Paid => "paid",
            TransactionState::PaidPartially => "paid_partially",
            TransactionState::Failed => "failed",
            TransactionState::Cancelled => "cancelled",
            TransactionState::Refunded => "refunded",
        }
    }

    /// Applies a transition, returning the target state.
    pub fn apply(self, transition: Transition) -> CoreResult<Self> {
        use TransactionState::*;
        match (self, transition) {
            (Open | Authorized | Paid | PaidPartially, Transition::Cancel) => Ok(Cancelled),
            (Open | Authorized | Paid, Transition::Fail) => Ok(Failed),
            _ => Err(illegal(Machine::Transaction, transition, self.as_str())),
        }
    }
}

impl FromStr for TransactionState {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(TransactionState::Open),
            "authorized" => Ok(TransactionState::Authorized),
            "paid" => Ok(TransactionState::Paid),
            "paid_partially" => Ok(TransactionState::PaidPartially),
            "failed" => Ok(TransactionState::Failed),
            "cancelled" => Ok(TransactionState::Cancelled),
            "refunded" => Ok(TransactionState::Refunded),
            other => Err(CoreError::UnknownState {
                machine: Machine::Transaction,
                value: other.to_string(),
            }),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_ship_from_open() {
        assert_eq!(
            DeliveryState::Open.apply(Transition::Ship),
            Ok(DeliveryState::Shipped)
        );
        assert_eq!(
            DeliveryState::ShippedPartially.apply(Transition::Ship),
            Ok(DeliveryState::Shipped)
        );
    }

    #[test]
    fn test_delivery_cannot_cancel_after_shipping() {
        let err = DeliveryState::Shipped.apply(Transition::Cancel).unwrap_err();
        assert!(matches!(
            err,
            CoreError::IllegalTransition {
                machine: Machine::Delivery,
                transition: Transition::Cancel,
                ..
            }
        ));
    }

    #[test]
    fn test_transaction_cancel_and_fail_from_paid() {
        assert_eq!(
            TransactionState::Paid.apply(Transition::Cancel),
            Ok(TransactionState::Cancelled)
        );
        assert_eq!(
            TransactionState::Paid.apply(Transition::Fail),
            Ok(TransactionState::Failed)
        );
        assert!(TransactionState::Refunded.apply(Transition::Fail).is_err());
    }

    #[test]
    fn test_order_transitions() {
        assert_eq!(
            OrderState::Open.apply(Transition::Cancel),
            Ok(OrderState::Cancelled)
        );
        assert!(OrderState::Open.apply(Transition::Complete).is_err());
        assert!(OrderState::Open.apply(Transition::Ship).is_err());
    }

    #[test]
    fn test_state_names_round_trip() {
        for state in [
            DeliveryState::Open,
            DeliveryState::ShippedPartially,
            DeliveryState::Shipped,
            DeliveryState::Returned,
            DeliveryState::Cancelled,
        ] {
            assert_eq!(state.as_str().parse::<DeliveryState>(), Ok(state));
        }
        assert!("teleported".parse::<TransactionState>().is_err());
    }
}
