//! # Sync Error Types
//!
//! Errors for the systemic failure modes of the sync engine. Expected
//! remote failures (a rejected create, an unknown status) are values
//! ([`ApiResponse`](crate::api::ApiResponse), [`ItemResult`](infoplus_core::ItemResult),
//! [`SyncOutcome`](infoplus_core::SyncOutcome)) and never reach this enum.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Data                │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Http           │  │  SerializationFailed    │ │
//! │  │  InvalidUrl     │  │  RequestFailed  │  │  Database               │ │
//! │  │  ConfigLoad/Save│  │  Timeout        │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  Internal: ChannelError • ShuttingDown • QueueFull • Internal   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use infoplus_db::DbError;
use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync error type covering systemic sync failures.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid sync configuration.
    ///
    /// ## When This Occurs
    /// - Empty API key or domain
    /// - Orders enabled without products, categories and customers
    /// - Zero page size or retry count
    #[error("Invalid sync configuration: {0}")]
    InvalidConfig(String),

    /// Invalid API base URL.
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// Remote answered with a non-success status.
    #[error("HTTP {status} from {endpoint}: {body}")]
    Http {
        status: u16,
        endpoint: String,
        body: String,
    },

    /// Request never produced a response (connect, TLS, body read).
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Request exceeded the per-call timeout.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    // =========================================================================
    // Data Errors
    // =========================================================================
    /// JSON encoding or decoding failed.
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// Local database failure.
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Internal sync engine error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Job queue is full.
    #[error("Sync job queue is full")]
    QueueFull,

    /// Agent is shutting down.
    #[error("Sync agent is shutting down")]
    ShuttingDown,

    /// Channel send/receive failed.
    #[error("Channel error: {0}")]
    ChannelError(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::SerializationFailed(err.to_string())
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidUrl(err.to_string())
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SyncError::SerializationFailed(err.to_string())
        } else {
            SyncError::RequestFailed(err.to_string())
        }
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization (for retry logic)
// =============================================================================

impl SyncError {
    /// Returns true if the call can be retried.
    ///
    /// ## Retryable Errors
    /// - Transport failures and timeouts
    /// - 5xx and 429 responses
    ///
    /// ## Non-Retryable Errors
    /// - Other 4xx responses (the request itself is wrong)
    /// - Configuration and data errors
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::RequestFailed(_) | SyncError::Timeout(_) => true,
            SyncError::Http { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_)
                | SyncError::InvalidUrl(_)
                | SyncError::ConfigLoadFailed(_)
                | SyncError::ConfigSaveFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(SyncError::RequestFailed("connection reset".into()).is_retryable());
        assert!(SyncError::Timeout(10).is_retryable());
        assert!(SyncError::Http {
            status: 503,
            endpoint: "item".into(),
            body: String::new()
        }
        .is_retryable());
        assert!(SyncError::Http {
            status: 429,
            endpoint: "item".into(),
            body: String::new()
        }
        .is_retryable());

        assert!(!SyncError::Http {
            status: 400,
            endpoint: "item".into(),
            body: "sku required".into()
        }
        .is_retryable());
        assert!(!SyncError::InvalidConfig("bad config".into()).is_retryable());
    }

    #[test]
    fn test_config_errors() {
        assert!(SyncError::InvalidUrl("nope".into()).is_config_error());
        assert!(!SyncError::ShuttingDown.is_config_error());
    }

    #[test]
    fn test_error_display() {
        let err = SyncError::Http {
            status: 404,
            endpoint: "customer/search".into(),
            body: "not found".into(),
        };
        assert_eq!(err.to_string(), "HTTP 404 from customer/search: not found");
    }
}
