//! # Region MemStore
//!
//! The in-memory write buffer of one region of a distributed key-value
//! table:
//! - Concurrent, byte-ordered row map with merge-on-write
//! - Size, oldest-edit and key-range accounting for flush policy
//! - Snapshot/flush handshake (freeze-and-swap of the active map)
//! - Column-filtered row scanners for the read path
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Write Path / Scan Execution                  │
//! └──────────────┬───────────────────────────────┬──────────────┘
//!                │ add / delete / get            │ scanners()
//! ┌──────────────▼───────────────────────────────▼──────────────┐
//! │                          MemStore                            │
//! │        size · oldest edit · key range · snapshot id          │
//! └──────────────┬───────────────────────────────┬──────────────┘
//!                │                               │
//!                ▼                               ▼
//!        ┌──────────────┐   snapshot()    ┌──────────────┐
//!        │ active map   │ ──────────────▶ │ snapshot map │ ──▶ flush pipeline
//!        │  (SkipMap)   │                 │   (frozen)   │
//!        └──────┬───────┘                 └──────┬───────┘
//!               ▼                                ▼
//!         RowScanner                       RowScanner
//!               └──────────▶ heap merge ◀────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod clock;

pub mod mutation;
pub mod schema;
pub mod memstore;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{MemStoreError, Result};
pub use config::{Config, SchemaPolicy};
pub use memstore::{MemStore, MemStoreSnapshot, RowScanner, ScanRequest};
pub use mutation::{Cell, Mutation, MutationKind};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
