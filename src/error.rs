//! Error types for the region memstore
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

use crate::mutation::MutationKind;

/// Result type alias using MemStoreError
pub type Result<T> = std::result::Result<T, MemStoreError>;

/// Unified error type for memstore operations
#[derive(Debug, Error)]
pub enum MemStoreError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A buffered cell could not be materialised during a scan
    #[error("Malformed cell: {0}")]
    MalformedCell(String),

    // -------------------------------------------------------------------------
    // Snapshot / Flush Errors
    // -------------------------------------------------------------------------
    /// Raised when a flush pipeline hands back a stale snapshot id
    #[error("Unexpected state: {0}")]
    UnexpectedState(String),

    // -------------------------------------------------------------------------
    // Write Path Errors
    // -------------------------------------------------------------------------
    #[error("No merge rule for {incoming:?} write onto buffered {existing:?} row")]
    UnsupportedMerge {
        existing: MutationKind,
        incoming: MutationKind,
    },

    // -------------------------------------------------------------------------
    // Read Path Errors
    // -------------------------------------------------------------------------
    #[error("Read schema parse error: {0}")]
    SchemaParse(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
