//! MemStore implementation
//!
//! Active/snapshot row maps with size and key range accounting.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use crossbeam::utils::CachePadded;
use parking_lot::RwLock;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{MemStoreError, Result};
use crate::mutation::Mutation;

use super::key_range::{KeyRange, KeyRangeTracker};
use super::request::ScanRequest;
use super::row_map::RowMap;
use super::scanner::{ColumnFilter, RangeSource, RowScanner};
use super::snapshot::MemStoreSnapshot;
use super::FlushTrigger;

/// Fixed overhead of the memstore object itself
pub const FIXED_OVERHEAD: u64 = align(16 + 4 * 8 + 2 * 8);

/// Overhead of one empty row map
pub const ROW_MAP_OVERHEAD: u64 = 128;

/// Baseline size of an empty memstore
pub const DEEP_OVERHEAD: u64 = align(FIXED_OVERHEAD + 24 + 2 * ROW_MAP_OVERHEAD);

/// Sentinel for "no edit since the active map was installed"
const NO_EDIT: u64 = u64::MAX;

const fn align(n: u64) -> u64 {
    (n + 7) & !7
}

/// The frozen map awaiting flush
struct SnapshotSlot {
    rows: Arc<RowMap>,
    id: Option<u64>,
    size: u64,
    range: Option<KeyRange>,
}

impl SnapshotSlot {
    fn empty() -> Self {
        Self {
            rows: Arc::new(RowMap::new()),
            id: None,
            size: 0,
            range: None,
        }
    }
}

/// In-memory write buffer for one region
///
/// ## Concurrency:
/// - `active`: RwLock around the map *handle*. Writers and readers hold the
///   read side for the duration of one operation; `snapshot()` takes the
///   write side only to swap the handle. The map itself is lock-free.
/// - `snapshot`: RwLock around the frozen slot. Its write side is the one
///   exclusive section of the store: `snapshot()` and `clear_snapshot()`.
///   Lock order is always `snapshot` then `active`.
/// - `size`, `oldest_edit`: atomics, approximate under concurrent writes
/// - `key_range`: see [`KeyRangeTracker`]
pub struct MemStore {
    config: Config,
    clock: Arc<dyn Clock>,

    /// Map currently accepting writes
    active: RwLock<Arc<RowMap>>,

    /// Frozen map awaiting flush (empty when none is pending)
    snapshot: RwLock<SnapshotSlot>,

    /// Heap size of the active map, including [`DEEP_OVERHEAD`]
    size: CachePadded<AtomicU64>,

    /// Unix millis of the first edit since the active map was installed
    oldest_edit: AtomicU64,

    key_range: Arc<KeyRangeTracker>,

    /// Last snapshot id handed out, keeps ids strictly increasing
    last_snapshot_id: AtomicU64,
}

impl MemStore {
    /// Create a memstore with the given config and the system clock
    pub fn new(config: Config) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a memstore reading time from `clock`
    pub fn with_clock(config: Config, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            clock,
            active: RwLock::new(Arc::new(RowMap::new())),
            snapshot: RwLock::new(SnapshotSlot::empty()),
            size: CachePadded::new(AtomicU64::new(DEEP_OVERHEAD)),
            oldest_edit: AtomicU64::new(NO_EDIT),
            key_range: Arc::new(KeyRangeTracker::new()),
            last_snapshot_id: AtomicU64::new(0),
        })
    }

    // =========================================================================
    // Write Path
    // =========================================================================

    /// Buffer a write.
    ///
    /// A write to a row already in the active map is merged into it (see
    /// [`Mutation::merge`]). Returns the estimated size of `mutation`.
    ///
    /// The store's size moves by the change in the row's buffered size, so
    /// overwritten cells are not counted twice.
    pub fn add(&self, mutation: Mutation) -> Result<u64> {
        let heap_size = mutation.heap_size();
        let row = mutation.row_bytes();

        let active = self.active.read();
        let upsert = active.upsert(mutation)?;
        if upsert.inserted {
            self.key_range.extend(&row);
        }
        if upsert.after >= upsert.before {
            self.size
                .fetch_add(upsert.after - upsert.before, Ordering::AcqRel);
        } else {
            self.shrink(upsert.before - upsert.after);
        }
        self.touch_oldest_edit();

        tracing::trace!(
            "Buffered row {:?} ({} bytes, new={})",
            String::from_utf8_lossy(&row),
            heap_size,
            upsert.inserted
        );
        Ok(heap_size)
    }

    /// Mutation buffered for `row` in the active map
    ///
    /// The snapshot map is not consulted.
    pub fn get(&self, row: &[u8]) -> Option<Mutation> {
        self.active.read().get(row)
    }

    /// Remove the row of `mutation` from the active map.
    ///
    /// Only the row key of `mutation` is used. Returns the estimated size of
    /// what was buffered for the row, or 0 if the row was not buffered.
    pub fn delete(&self, mutation: &Mutation) -> u64 {
        let active = self.active.read();
        let heap_size = match active.remove(mutation.row()) {
            Some(removed) => removed.heap_size(),
            None => return 0,
        };

        self.shrink(heap_size);
        if active.is_empty() {
            self.key_range.clear_if(|| active.is_empty());
        }
        self.touch_oldest_edit();
        heap_size
    }

    /// Rows in the active map
    pub fn record_count(&self) -> usize {
        self.active.read().len()
    }

    // =========================================================================
    // Snapshot / Flush Handshake
    // =========================================================================

    /// Freeze the active map for flushing.
    ///
    /// Returns `None` while a previous non-empty snapshot has not been
    /// cleared; the caller retries once that flush completes. If the active
    /// map is empty the returned snapshot is empty too.
    pub fn snapshot(&self) -> Option<MemStoreSnapshot> {
        let mut slot = self.snapshot.write();
        if !slot.rows.is_empty() {
            tracing::warn!(
                "Snapshot called again without clearing previous (id={:?}). \
                 Doing nothing. Another ongoing flush or did we fail last attempt?",
                slot.id
            );
            return None;
        }

        let id = self.next_snapshot_id();
        let (size, range) = {
            let mut active = self.active.write();
            let size = self.size();
            if !active.is_empty() {
                slot.rows = std::mem::replace(&mut *active, Arc::new(RowMap::new()));
                self.size.store(DEEP_OVERHEAD, Ordering::Release);
                self.oldest_edit.store(NO_EDIT, Ordering::Release);
            }
            (size, self.key_range.take())
        };

        slot.id = Some(id);
        slot.size = size;
        slot.range = range.clone();

        let record_count = slot.rows.len();
        let scanner = RowScanner::new(
            Arc::clone(&slot.rows),
            ColumnFilter::all(),
            RangeSource::Frozen(range.clone()),
        );

        tracing::debug!(
            "Created snapshot {} with {} rows ({} bytes)",
            id,
            record_count,
            size
        );
        Some(MemStoreSnapshot::new(id, record_count, size, scanner, range))
    }

    /// Drop the snapshot once its rows are durable.
    ///
    /// Fails with [`MemStoreError::UnexpectedState`] if `id` is not the
    /// pending snapshot's id; the snapshot is left untouched in that case.
    pub fn clear_snapshot(&self, id: u64) -> Result<()> {
        let mut slot = self.snapshot.write();
        if slot.id != Some(id) {
            return Err(MemStoreError::UnexpectedState(format!(
                "Current snapshot id is {:?}, passed {}",
                slot.id, id
            )));
        }

        let rows = slot.rows.len();
        *slot = SnapshotSlot::empty();

        tracing::debug!("Cleared snapshot {} ({} rows)", id, rows);
        Ok(())
    }

    /// Id of the pending snapshot
    pub fn current_snapshot_id(&self) -> Option<u64> {
        self.snapshot.read().id
    }

    /// Rows in the pending snapshot
    pub fn snapshot_record_count(&self) -> usize {
        self.snapshot.read().rows.len()
    }

    /// Subtract from the active size, never going below the empty baseline
    fn shrink(&self, bytes: u64) {
        let _ = self
            .size
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |size| {
                Some(size.saturating_sub(bytes).max(DEEP_OVERHEAD))
            });
    }

    fn next_snapshot_id(&self) -> u64 {
        let now = self.clock.now_millis();
        let mut prev = self.last_snapshot_id.load(Ordering::Acquire);
        loop {
            let id = now.max(prev + 1);
            match self.last_snapshot_id.compare_exchange_weak(
                prev,
                id,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return id,
                Err(actual) => prev = actual,
            }
        }
    }

    // =========================================================================
    // Scanners
    // =========================================================================

    /// Scanner over the active map
    pub fn active_scanner(&self, scan: &ScanRequest) -> Result<RowScanner> {
        let filter = ColumnFilter::from_request(scan, &self.config)?;
        let rows = Arc::clone(&*self.active.read());
        Ok(RowScanner::new(
            rows,
            filter,
            RangeSource::Live(Arc::clone(&self.key_range)),
        ))
    }

    /// Scanner over the pending snapshot map
    pub fn snapshot_scanner(&self, scan: &ScanRequest) -> Result<RowScanner> {
        let filter = ColumnFilter::from_request(scan, &self.config)?;
        let slot = self.snapshot.read();
        Ok(RowScanner::new(
            Arc::clone(&slot.rows),
            filter,
            RangeSource::Frozen(slot.range.clone()),
        ))
    }

    /// Scanners to hand to the heap merge, each positioned at `start_row`.
    ///
    /// The snapshot scanner comes first if a non-empty snapshot is pending,
    /// then the active scanner if the active map holds rows.
    pub fn scanners(&self, start_row: &[u8], scan: &ScanRequest) -> Result<Vec<RowScanner>> {
        let filter = ColumnFilter::from_request(scan, &self.config)?;
        let mut scanners = Vec::with_capacity(2);

        let slot = self.snapshot.read();
        let active = self.active.read();

        if !slot.rows.is_empty() {
            let mut scanner = RowScanner::new(
                Arc::clone(&slot.rows),
                filter.clone(),
                RangeSource::Frozen(slot.range.clone()),
            );
            scanner.seek(start_row);
            scanners.push(scanner);
        }
        if !active.is_empty() {
            let mut scanner = RowScanner::new(
                Arc::clone(&*active),
                filter,
                RangeSource::Live(Arc::clone(&self.key_range)),
            );
            scanner.seek(start_row);
            scanners.push(scanner);
        }

        Ok(scanners)
    }

    // =========================================================================
    // Accounting
    // =========================================================================

    /// Heap size of the active map, including fixed overhead
    pub fn heap_size(&self) -> u64 {
        self.size.load(Ordering::Acquire)
    }

    /// Same as [`heap_size`](Self::heap_size)
    pub fn size(&self) -> u64 {
        self.heap_size()
    }

    /// Buffered payload size, excluding fixed overhead
    pub fn data_size(&self) -> u64 {
        self.size().saturating_sub(DEEP_OVERHEAD)
    }

    /// Bytes the next flush would write: the pending snapshot's size,
    /// or the active size when no rows are frozen
    ///
    /// A snapshot taken over an empty active map records an id but holds
    /// nothing, so it reports the active size.
    pub fn flushable_size(&self) -> u64 {
        let slot = self.snapshot.read();
        if slot.rows.is_empty() {
            self.size()
        } else {
            slot.size
        }
    }

    /// Unix millis of the oldest unflushed edit in the active map
    pub fn time_of_oldest_edit(&self) -> Option<u64> {
        match self.oldest_edit.load(Ordering::Acquire) {
            NO_EDIT => None,
            ts => Some(ts),
        }
    }

    /// Smallest row key written since the last snapshot
    pub fn start_key(&self) -> Option<Bytes> {
        self.key_range.start_key()
    }

    /// Largest row key written since the last snapshot
    pub fn end_key(&self) -> Option<Bytes> {
        self.key_range.end_key()
    }

    /// Whether the flush policy calls for a flush now
    pub fn flush_trigger(&self) -> Option<FlushTrigger> {
        if self.data_size() >= self.config.flush_size_threshold {
            return Some(FlushTrigger::Size);
        }
        let interval = self.config.flush_interval_ms;
        if interval > 0 {
            if let Some(oldest) = self.time_of_oldest_edit() {
                if self.clock.now_millis().saturating_sub(oldest) >= interval {
                    return Some(FlushTrigger::Age);
                }
            }
        }
        None
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Log every buffered row of the active map
    pub fn dump(&self) {
        let active = self.active.read();
        active.for_each(|row, mutation| {
            tracing::info!(
                "{:?}: {:?} {:?}",
                String::from_utf8_lossy(row),
                mutation.kind(),
                mutation
                    .cells()
                    .map(|c| {
                        format!(
                            "{}:{}={}",
                            String::from_utf8_lossy(c.family()),
                            String::from_utf8_lossy(c.qualifier()),
                            String::from_utf8_lossy(c.value())
                        )
                    })
                    .collect::<Vec<_>>()
            );
        });
    }

    fn touch_oldest_edit(&self) {
        let now = self.clock.now_millis();
        let _ = self
            .oldest_edit
            .compare_exchange(NO_EDIT, now, Ordering::AcqRel, Ordering::Acquire);
    }
}
