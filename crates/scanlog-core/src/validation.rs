//! # Validation Module
//!
//! Checks that run at the boundary, before any storage call.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler (scanlog-api)                                   │
//! │  ├── Path id must match ^\d+$        ──► 400, storage untouched        │
//! │  └── Body must decode                ──► 400, storage untouched        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── validate_code_id / parse_code_id                                  │
//! │  └── validate_patch                                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL + DEFAULT on data / type                                 │
//! │  └── UNIQUE on scan_id                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use uuid::Uuid;

use crate::error::ValidationError;
use crate::types::CodePatch;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Id Validators
// =============================================================================

/// Validates a remote record id: one or more ASCII digits, nothing else.
///
/// ## Example
/// ```rust
/// use scanlog_core::validation::validate_code_id;
///
/// assert!(validate_code_id("0").is_ok());
/// assert!(validate_code_id("123").is_ok());
/// assert!(validate_code_id("").is_err());
/// assert!(validate_code_id("-1").is_err());
/// assert!(validate_code_id(" 1").is_err());
/// ```
pub fn validate_code_id(raw: &str) -> ValidationResult<()> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidId {
            value: raw.to_string(),
        });
    }

    Ok(())
}

/// Validates and parses a remote record id.
///
/// ## Returns
/// * `Ok(Some(id))` - well-formed and representable
/// * `Ok(None)` - well-formed but beyond `i64`, so no row can carry it
/// * `Err(InvalidId)` - not a non-negative integer literal
pub fn parse_code_id(raw: &str) -> ValidationResult<Option<i64>> {
    validate_code_id(raw)?;
    Ok(raw.parse::<i64>().ok())
}

/// Validates an update body.
pub fn validate_patch(patch: &CodePatch) -> ValidationResult<()> {
    if patch.is_empty() {
        return Err(ValidationError::EmptyPatch);
    }
    Ok(())
}

// =============================================================================
// Local Ids
// =============================================================================

/// Generates a device-store key: 32 lowercase hex characters.
///
/// Same shape the device table produces on its own
/// (`lower(hex(randomblob(16)))`).
pub fn generate_local_id() -> String {
    local_id_for(&Uuid::new_v4())
}

/// Device-store key for a given scan identity.
pub fn local_id_for(scan_id: &Uuid) -> String {
    scan_id.simple().to_string()
}

/// Returns true if `id` has the device-store key shape.
pub fn is_local_id(id: &str) -> bool {
    id.len() == 32 && id.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_code_id() {
        assert!(validate_code_id("1").is_ok());
        assert!(validate_code_id("0007").is_ok());
        assert!(validate_code_id("99999999999999999999999").is_ok());

        for bad in ["", "abc", "1a", "-1", "+1", "1.0", "1 ", "١٢"] {
            assert_eq!(
                validate_code_id(bad),
                Err(ValidationError::InvalidId {
                    value: bad.to_string()
                }),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_code_id() {
        assert_eq!(parse_code_id("15").unwrap(), Some(15));
        assert_eq!(parse_code_id("99999999999999999999999").unwrap(), None);
        assert!(parse_code_id("x").is_err());
    }

    #[test]
    fn test_validate_patch() {
        assert_eq!(
            validate_patch(&CodePatch::default()),
            Err(ValidationError::EmptyPatch)
        );
        let patch = CodePatch {
            data: Some(String::new()),
            code_type: None,
        };
        assert!(validate_patch(&patch).is_ok());
    }

    #[test]
    fn test_local_ids() {
        let id = generate_local_id();
        assert!(is_local_id(&id));
        assert_ne!(id, generate_local_id());

        assert!(!is_local_id("ABCDEF0123456789ABCDEF0123456789"));
        assert!(!is_local_id("abc"));

        let scan = Uuid::new_v4();
        assert_eq!(local_id_for(&scan), scan.simple().to_string());
    }
}
