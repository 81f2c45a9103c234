//! # Error Types
//!
//! Domain-specific error types for infoplus-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  infoplus-core errors (this file)                                       │
//! │  ├── CoreError        - Domain rule violations                          │
//! │  └── ValidationError  - Natural key / payload validation failures       │
//! │                                                                         │
//! │  infoplus-db errors (separate crate)                                    │
//! │  └── DbError          - Database operation failures                     │
//! │                                                                         │
//! │  infoplus-sync errors (separate crate)                                  │
//! │  └── SyncError        - Config, transport, persistence failures         │
//! │                                                                         │
//! │  Per-item failures never travel as errors: the engine turns them into   │
//! │  `ItemResult { success: false, error: Some(..) }`.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::state::{Machine, Transition};

// =============================================================================
// Core Error
// =============================================================================

/// Domain rule violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A state machine does not allow the requested transition.
    ///
    /// ## When This Occurs
    /// - Remote says "shipped" but the local delivery is already cancelled
    /// - Remote says "cancelled" but the local delivery has shipped
    #[error("Illegal {machine} transition '{transition}' from state '{from}'")]
    IllegalTransition {
        machine: Machine,
        transition: Transition,
        from: String,
    },

    /// A stored status string does not name a known state.
    #[error("Unknown {machine} state: '{value}'")]
    UnknownState { machine: Machine, value: String },

    /// A stored entity type string is not one of the four mapped kinds.
    #[error("Unknown entity type: '{0}'")]
    UnknownEntityType(String),

    /// A product has no major/sub group classification.
    #[error("Product {sku} is missing its major/sub group classification")]
    MissingClassification { sku: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors raised before a payload is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long for the remote column.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value contains characters the remote filter syntax cannot carry.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
