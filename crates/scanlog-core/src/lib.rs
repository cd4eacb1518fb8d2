//! # scanlog-core: Pure Domain Types for Scanlog
//!
//! Everything both stores and the client agree on: the shape of a scanned
//! code, the shapes used to create and update one, and the checks that run
//! before a request is allowed anywhere near storage.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Scanlog Architecture                           │
//! │                                                                         │
//! │  Capture (camera SDK) ──► CaptureEvent { data, type }                  │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  scanlog-sync (SyncCoordinator)                 │   │
//! │  └───────────────┬──────────────────────────────┬──────────────────┘   │
//! │                  │ HTTP                         │ embedded              │
//! │  ┌───────────────▼──────────────┐  ┌────────────▼─────────────────┐   │
//! │  │ scanlog-api (remote store)   │  │ scanlog-db (local store)     │   │
//! │  └──────────────────────────────┘  └──────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               ★ scanlog-core (THIS CRATE) ★                     │   │
//! │  │   ScannedCode • LocalCode • NewScannedCode • CodePatch          │   │
//! │  │   validate_code_id • validate_patch • generate_local_id         │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Records, write shapes, capture events
//! - [`error`] - Domain error types
//! - [`validation`] - Id format and update checks
//!
//! ## Example Usage
//!
//! ```rust
//! use scanlog_core::validation::parse_code_id;
//!
//! assert_eq!(parse_code_id("42").unwrap(), Some(42));
//! assert!(parse_code_id("4a").is_err());
//! ```

pub mod error;
pub mod types;
pub mod validation;

pub use error::{CoreError, CoreResult, ValidationError};
pub use types::*;

/// Symbology assumed when a write does not name one.
pub const DEFAULT_CODE_TYPE: &str = "QR";

/// Payload stored when a write does not carry one.
pub const DEFAULT_CODE_DATA: &str = "";
