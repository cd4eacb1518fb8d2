//! # Sync Error Types
//!
//! Error types for client-side operations.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Remote answer       │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Connection     │  │  InvalidRequest (400)   │ │
//! │  │  InvalidUrl     │  │  Timeout        │  │  NotFound       (404)   │ │
//! │  │  ConfigLoad/Save│  │  Http           │  │  Remote         (5xx)   │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐                              │
//! │  │    Database     │  │    Internal     │                              │
//! │  │  DatabaseError  │  │  task failures  │                              │
//! │  │                 │  │                 │                              │
//! │  └─────────────────┘  └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync error type covering all client-side failures.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid client configuration.
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    /// Invalid remote store URL.
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
    /// Could not reach the remote store.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request exceeded the configured timeout.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Any other HTTP-level failure.
    #[error("HTTP error: {0}")]
    Http(String),

    // =========================================================================
    // Remote Answers
    // =========================================================================
    /// The remote store rejected the request (400).
    #[error("Rejected by remote store: {message}")]
    InvalidRequest { code: String, message: String },

    /// The remote store has no such record (404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// The remote store failed (5xx or an unexpected status).
    #[error("Remote store error ({status}): {message}")]
    Remote { status: u16, message: String },

    /// A success response whose body could not be understood.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    // =========================================================================
    // Database Errors
    // =========================================================================
    /// Device store failure.
    #[error("Database error: {0}")]
    DatabaseError(String),

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// A background task panicked or was cancelled.
    #[error("Internal error: {0}")]
    Internal(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<scanlog_db::DbError> for SyncError {
    fn from(err: scanlog_db::DbError) -> Self {
        SyncError::DatabaseError(err.to_string())
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SyncError::Timeout(err.to_string())
        } else if err.is_connect() {
            SyncError::ConnectionFailed(err.to_string())
        } else if err.is_decode() {
            SyncError::UnexpectedResponse(err.to_string())
        } else {
            SyncError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::UnexpectedResponse(err.to_string())
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidUrl(err.to_string())
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
// Error Categorization
// =============================================================================

impl SyncError {
    /// Returns true if the same request could succeed later.
    ///
    /// ## Retryable Errors
    /// - Connection failures and timeouts
    /// - Server-side failures (5xx)
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::ConnectionFailed(_) | SyncError::Timeout(_) => true,
            SyncError::Remote { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns true if the remote store reported a missing record.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SyncError::NotFound(_))
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
        assert!(SyncError::ConnectionFailed("refused".into()).is_retryable());
        assert!(SyncError::Timeout("10s".into()).is_retryable());
        assert!(SyncError::Remote {
            status: 503,
            message: "busy".into()
        }
        .is_retryable());

        assert!(!SyncError::NotFound("7".into()).is_retryable());
        assert!(!SyncError::InvalidRequest {
            code: "INVALID_ID".into(),
            message: "bad".into()
        }
        .is_retryable());
        assert!(!SyncError::InvalidConfig("bad".into()).is_retryable());
    }

    #[test]
    fn test_categories() {
        assert!(SyncError::NotFound("x".into()).is_not_found());
        assert!(!SyncError::Http("x".into()).is_not_found());
        assert!(SyncError::InvalidUrl("x".into()).is_config_error());
    }

    #[test]
    fn test_db_error_conversion() {
        let err: SyncError = scanlog_db::DbError::Closed.into();
        assert!(matches!(err, SyncError::DatabaseError(ref m) if m.contains("closed")));
    }
}
