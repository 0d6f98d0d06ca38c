//! Mutation Module
//!
//! Pending writes for a single row.
//!
//! ## Responsibilities
//! - Hold the cells of one row keyed by (family, qualifier)
//! - Estimate heap size for flush accounting
//! - Merge a later write into an already-buffered one
//! - Encode/decode for the upstream write path
//!
//! ## Merge Rules
//! | buffered | incoming | result                                  |
//! |----------|----------|-----------------------------------------|
//! | Put      | Put      | upsert incoming cells, keep the others  |
//! | any      | Delete   | `UnsupportedMerge`                      |
//! | Delete   | any      | `UnsupportedMerge`                      |

mod cell;

use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{MemStoreError, Result};

pub use cell::{Cell, CELL_OVERHEAD};

/// Timestamp used for cells added without an explicit one
pub const LATEST_TIMESTAMP: u64 = u64::MAX;

/// Per-mutation bookkeeping overhead counted in heap size estimates
pub const MUTATION_OVERHEAD: u64 = 96;

/// Kind of write a mutation represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutationKind {
    /// Upsert of the carried cells
    Put,

    /// Row delete marker
    Delete,
}

/// A pending write to one row
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mutation {
    row: Bytes,
    kind: MutationKind,
    timestamp: u64,
    cells: BTreeMap<(Bytes, Bytes), Cell>,
}

impl Mutation {
    /// Create an empty put for `row`
    pub fn put(row: impl Into<Bytes>) -> Self {
        Self::new(row, MutationKind::Put, LATEST_TIMESTAMP)
    }

    /// Create a delete marker for `row`
    pub fn delete(row: impl Into<Bytes>) -> Self {
        Self::new(row, MutationKind::Delete, LATEST_TIMESTAMP)
    }

    pub fn new(row: impl Into<Bytes>, kind: MutationKind, timestamp: u64) -> Self {
        Self {
            row: row.into(),
            kind,
            timestamp,
            cells: BTreeMap::new(),
        }
    }

    /// Add a cell stamped with the mutation's timestamp
    pub fn add_column(
        &mut self,
        family: impl Into<Bytes>,
        qualifier: impl Into<Bytes>,
        value: impl Into<Bytes>,
    ) -> &mut Self {
        let ts = self.timestamp;
        self.add_column_at(family, qualifier, ts, value)
    }

    /// Add a cell with an explicit timestamp, replacing any cell at the same column
    pub fn add_column_at(
        &mut self,
        family: impl Into<Bytes>,
        qualifier: impl Into<Bytes>,
        timestamp: u64,
        value: impl Into<Bytes>,
    ) -> &mut Self {
        let cell = Cell::new(self.row.clone(), family, qualifier, timestamp, value);
        self.cells.insert(cell.column_key(), cell);
        self
    }

    /// Chaining form of [`Mutation::add_column`]
    pub fn with_column(
        mut self,
        family: impl Into<Bytes>,
        qualifier: impl Into<Bytes>,
        value: impl Into<Bytes>,
    ) -> Self {
        self.add_column(family, qualifier, value);
        self
    }

    pub fn row(&self) -> &[u8] {
        &self.row
    }

    pub(crate) fn row_bytes(&self) -> Bytes {
        self.row.clone()
    }

    pub fn kind(&self) -> MutationKind {
        self.kind
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Number of cells carried
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Look up the cell at (family, qualifier)
    pub fn cell(&self, family: &[u8], qualifier: &[u8]) -> Option<&Cell> {
        self.cells.get(&(
            Bytes::copy_from_slice(family),
            Bytes::copy_from_slice(qualifier),
        ))
    }

    /// Cells in (family, qualifier) order
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }

    /// Cells in (family, qualifier) order, validating each one as it is read
    pub fn cell_scanner(&self) -> CellScanner<'_> {
        CellScanner {
            inner: self.cells.values(),
        }
    }

    /// Approximate in-memory footprint of this mutation
    pub fn heap_size(&self) -> u64 {
        MUTATION_OVERHEAD
            + self.row.len() as u64
            + self.cells.values().map(Cell::heap_size).sum::<u64>()
    }

    /// Fold a later write to the same row into this one
    pub fn merge(&mut self, incoming: Mutation) -> Result<()> {
        match (self.kind, incoming.kind) {
            (MutationKind::Put, MutationKind::Put) => {
                self.cells.extend(incoming.cells);
                Ok(())
            }
            (existing, incoming) => Err(MemStoreError::UnsupportedMerge { existing, incoming }),
        }
    }

    // =========================================================================
    // Wire Form
    // =========================================================================

    pub fn encode(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| MemStoreError::Serialization(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| MemStoreError::Serialization(e.to_string()))
    }
}

impl fmt::Debug for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutation")
            .field("row", &String::from_utf8_lossy(&self.row))
            .field("kind", &self.kind)
            .field("cells", &self.cells.len())
            .finish()
    }
}

/// Iterator over a mutation's cells that rejects cells without a column family
pub struct CellScanner<'a> {
    inner: std::collections::btree_map::Values<'a, (Bytes, Bytes), Cell>,
}

impl<'a> Iterator for CellScanner<'a> {
    type Item = Result<&'a Cell>;

    fn next(&mut self) -> Option<Self::Item> {
        let cell = self.inner.next()?;
        if cell.family().is_empty() {
            return Some(Err(MemStoreError::MalformedCell(format!(
                "cell {:?} of row {:?} has no column family",
                String::from_utf8_lossy(cell.qualifier()),
                String::from_utf8_lossy(cell.row())
            ))));
        }
        Some(Ok(cell))
    }
}
