//! # Repository Module
//!
//! Database repository implementations for the remote record store.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP handler                                                          │
//! │       │  db.codes().get_by_id(7)                                       │
//! │       ▼                                                                 │
//! │  CodeRepository                                                        │
//! │  ├── list(type_filter)                                                 │
//! │  ├── get_by_id(id)                                                     │
//! │  ├── insert(new_code)                                                  │
//! │  ├── update(id, patch)                                                 │
//! │  └── delete(id)                                                        │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite `codes` table                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod code;

pub use code::CodeRepository;
