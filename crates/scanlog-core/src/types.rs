//! # Domain Types
//!
//! The scanned-code entity in its two stored forms plus the shapes used to
//! write it.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  ScannedCode    │   │   LocalCode     │   │  CaptureEvent   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (i64, auto) │   │  id (32 hex)    │   │  data           │       │
//! │  │  scan_id (uuid) │   │  data           │   │  type           │       │
//! │  │  data           │   │  type           │   └─────────────────┘       │
//! │  │  type           │   └─────────────────┘                              │
//! │  └─────────────────┘                                                    │
//! │   remote table           device table          from the camera SDK     │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                              │
//! │  │ NewScannedCode  │   │   CodePatch     │   write shapes; absent       │
//! │  │ data?, type?,   │   │ data?, type?    │   fields fall back to the    │
//! │  │ scanId?         │   │                 │   column defaults            │
//! │  └─────────────────┘   └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Shared Scan Identity
//! The remote store numbers rows itself and the device store keys rows by a
//! hex string. A scan carries one UUID from capture onwards: the device store
//! uses its simple (32 hex) form as the key, the remote store keeps it in
//! `scan_id`. Either store can then be matched against the other.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::{DEFAULT_CODE_DATA, DEFAULT_CODE_TYPE};

// =============================================================================
// Scanned Code (remote)
// =============================================================================

/// A scanned code as held by the remote store.
///
/// Serialized as `{"id": 1, "scanId": "...", "data": "ABC123", "type": "qr"}`;
/// `scanId` is left out when the record has none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ScannedCode {
    /// Auto-incrementing id assigned by the remote store.
    #[ts(type = "number")]
    pub id: i64,

    /// Client-generated scan identity, if the writer supplied one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub scan_id: Option<String>,

    /// Decoded payload.
    pub data: String,

    /// Symbology (`qr`, `code128`, ...).
    #[serde(rename = "type")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "type"))]
    pub code_type: String,
}

// =============================================================================
// Local Code (device)
// =============================================================================

/// A scanned code as held by the device-embedded store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct LocalCode {
    /// 32 lowercase hex characters.
    pub id: String,

    pub data: String,

    #[serde(rename = "type")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "type"))]
    pub code_type: String,
}

// =============================================================================
// Write Shapes
// =============================================================================

/// Body of a create request.
///
/// Absent (or `null`) fields take the column defaults: empty `data`,
/// `"QR"` type, no scan id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewScannedCode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub code_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_id: Option<String>,
}

impl NewScannedCode {
    /// Creates a body carrying both payload fields.
    pub fn new(data: impl Into<String>, code_type: impl Into<String>) -> Self {
        NewScannedCode {
            data: Some(data.into()),
            code_type: Some(code_type.into()),
            scan_id: None,
        }
    }

    /// Attaches the client-generated scan identity.
    pub fn with_scan_id(mut self, scan_id: impl Into<String>) -> Self {
        self.scan_id = Some(scan_id.into());
        self
    }

    /// Payload after defaulting.
    pub fn resolved_data(&self) -> &str {
        self.data.as_deref().unwrap_or(DEFAULT_CODE_DATA)
    }

    /// Symbology after defaulting.
    pub fn resolved_type(&self) -> &str {
        self.code_type.as_deref().unwrap_or(DEFAULT_CODE_TYPE)
    }
}

/// Body of an update request. Only present fields are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CodePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub code_type: Option<String>,
}

impl CodePatch {
    /// Returns true when the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.data.is_none() && self.code_type.is_none()
    }
}

// =============================================================================
// Capture Event
// =============================================================================

/// A decoded code handed over by the capture collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CaptureEvent {
    pub data: String,

    #[serde(rename = "type")]
    pub code_type: String,
}

impl CaptureEvent {
    pub fn new(data: impl Into<String>, code_type: impl Into<String>) -> Self {
        CaptureEvent {
            data: data.into(),
            code_type: code_type.into(),
        }
    }

    /// Parses a text line of the form `<type> <data>`.
    ///
    /// A line with a single token is taken as data of the default type.
    /// Everything after the first space belongs to `data`.
    ///
    /// ```rust
    /// use scanlog_core::CaptureEvent;
    ///
    /// let ev = CaptureEvent::from_line("code128 X 1").unwrap();
    /// assert_eq!(ev.code_type, "code128");
    /// assert_eq!(ev.data, "X 1");
    /// ```
    pub fn from_line(line: &str) -> CoreResult<Self> {
        let line = line.trim();
        if line.is_empty() {
            return Err(CoreError::InvalidCaptureEvent("empty line".to_string()));
        }

        match line.split_once(char::is_whitespace) {
            Some((code_type, data)) => Ok(CaptureEvent::new(data.trim_start(), code_type)),
            None => Ok(CaptureEvent::new(line, DEFAULT_CODE_TYPE)),
        }
    }

    /// Converts the event into a create body carrying `scan_id`.
    pub fn into_new_code(self, scan_id: impl Into<String>) -> NewScannedCode {
        NewScannedCode::new(self.data, self.code_type).with_scan_id(scan_id)
    }
}
