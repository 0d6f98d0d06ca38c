//! Cell definition
//!
//! A single (family, qualifier, timestamp, value) datum of a row.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Per-cell bookkeeping overhead counted in heap size estimates
/// (five buffer handles plus the timestamp)
pub const CELL_OVERHEAD: u64 = 5 * 32 + 8;

/// One column value of a row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    row: Bytes,
    family: Bytes,
    qualifier: Bytes,
    timestamp: u64,
    value: Bytes,
}

impl Cell {
    pub fn new(
        row: impl Into<Bytes>,
        family: impl Into<Bytes>,
        qualifier: impl Into<Bytes>,
        timestamp: u64,
        value: impl Into<Bytes>,
    ) -> Self {
        Self {
            row: row.into(),
            family: family.into(),
            qualifier: qualifier.into(),
            timestamp,
            value: value.into(),
        }
    }

    pub fn row(&self) -> &[u8] {
        &self.row
    }

    pub fn family(&self) -> &[u8] {
        &self.family
    }

    pub fn qualifier(&self) -> &[u8] {
        &self.qualifier
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Whether this cell's qualifier is exactly `qualifier`
    pub fn matches_qualifier(&self, qualifier: &[u8]) -> bool {
        self.qualifier.as_ref() == qualifier
    }

    /// Approximate in-memory footprint of this cell
    pub fn heap_size(&self) -> u64 {
        CELL_OVERHEAD
            + (self.row.len() + self.family.len() + self.qualifier.len() + self.value.len()) as u64
    }

    pub(crate) fn column_key(&self) -> (Bytes, Bytes) {
        (self.family.clone(), self.qualifier.clone())
    }
}
