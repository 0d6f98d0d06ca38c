//! Memstore snapshot
//!
//! Frozen rows handed to the flush pipeline.

use bytes::Bytes;

use super::key_range::KeyRange;
use super::scanner::RowScanner;

/// Point-in-time view of the rows moved out of the active map.
///
/// Once the rows are durably written the flush pipeline must call
/// [`MemStore::clear_snapshot`](super::MemStore::clear_snapshot) with
/// [`id`](Self::id); until then no further snapshot can be taken.
#[derive(Debug)]
pub struct MemStoreSnapshot {
    id: u64,
    record_count: usize,
    size: u64,
    scanner: RowScanner,
    key_range: Option<KeyRange>,
}

impl MemStoreSnapshot {
    pub(crate) fn new(
        id: u64,
        record_count: usize,
        size: u64,
        scanner: RowScanner,
        key_range: Option<KeyRange>,
    ) -> Self {
        Self {
            id,
            record_count,
            size,
            scanner,
            key_range,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Rows in the snapshot
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Memstore size at the time of the snapshot
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn scanner(&mut self) -> &mut RowScanner {
        &mut self.scanner
    }

    pub fn into_scanner(self) -> RowScanner {
        self.scanner
    }

    pub fn start_key(&self) -> Option<&Bytes> {
        self.key_range.as_ref().map(KeyRange::start)
    }

    pub fn end_key(&self) -> Option<&Bytes> {
        self.key_range.as_ref().map(KeyRange::end)
    }
}
