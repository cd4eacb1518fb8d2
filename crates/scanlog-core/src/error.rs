//! # Error Types
//!
//! Domain-specific error types for scanlog-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  scanlog-core errors (this file)                                       │
//! │  ├── CoreError        - Malformed capture input                        │
//! │  └── ValidationError  - Rejected before storage is touched             │
//! │                                                                         │
//! │  scanlog-db errors                                                     │
//! │  └── DbError          - SQLite failures                                │
//! │                                                                         │
//! │  scanlog-api errors                                                    │
//! │  └── ApiError         - What HTTP callers see                          │
//! │                                                                         │
//! │  Flow: ValidationError → ApiError (400), DbError → ApiError (404/500)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Errors raised while turning raw capture input into domain values.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The capture collaborator produced something that is not an event.
    #[error("Invalid capture event: {0}")]
    InvalidCaptureEvent(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These are produced at the boundary, so a request that fails here never
/// reaches a storage call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Record id is not a non-negative integer literal.
    ///
    /// ## When This Occurs
    /// - `GET /codigos/abc`
    /// - `PUT /codigos/-1`
    /// - `DELETE /codigos/1.5`
    #[error("Invalid id '{value}': must be a non-negative integer")]
    InvalidId { value: String },

    /// An update carried no fields to apply.
    #[error("Update must set at least one of: data, type")]
    EmptyPatch,
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ValidationError::InvalidId {
            value: "abc".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid id 'abc': must be a non-negative integer"
        );
        assert_eq!(
            ValidationError::EmptyPatch.to_string(),
            "Update must set at least one of: data, type"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::EmptyPatch.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
