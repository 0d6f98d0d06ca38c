//! Key range tracking
//!
//! Records the smallest and largest row key written to the active map
//! since the last snapshot.

use bytes::Bytes;
use parking_lot::RwLock;

/// Inclusive row key range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRange {
    start: Bytes,
    end: Bytes,
}

impl KeyRange {
    pub fn new(start: Bytes, end: Bytes) -> Self {
        Self { start, end }
    }

    pub fn start(&self) -> &Bytes {
        &self.start
    }

    pub fn end(&self) -> &Bytes {
        &self.end
    }

    pub fn contains(&self, row: &[u8]) -> bool {
        self.start.as_ref() <= row && row <= self.end.as_ref()
    }
}

/// Shared, concurrently updated key range
///
/// Writers whose key already falls inside the range only take the read
/// lock, so steady-state writes do not contend here.
#[derive(Debug, Default)]
pub struct KeyRangeTracker {
    range: RwLock<Option<KeyRange>>,
}

impl KeyRangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Widen the range to include `row`
    pub fn extend(&self, row: &Bytes) {
        if self.range.read().as_ref().is_some_and(|r| r.contains(row)) {
            return;
        }

        let mut range = self.range.write();
        match range.as_mut() {
            None => *range = Some(KeyRange::new(row.clone(), row.clone())),
            Some(r) => {
                if row < &r.start {
                    r.start = row.clone();
                }
                if &r.end < row {
                    r.end = row.clone();
                }
            }
        }
    }

    pub fn get(&self) -> Option<KeyRange> {
        self.range.read().clone()
    }

    pub fn start_key(&self) -> Option<Bytes> {
        self.range.read().as_ref().map(|r| r.start.clone())
    }

    pub fn end_key(&self) -> Option<Bytes> {
        self.range.read().as_ref().map(|r| r.end.clone())
    }

    /// Take the current range, leaving it unset
    pub fn take(&self) -> Option<KeyRange> {
        self.range.write().take()
    }

    /// Unset the range if `is_empty` still holds once the write lock is held
    pub fn clear_if(&self, is_empty: impl FnOnce() -> bool) {
        let mut range = self.range.write();
        if is_empty() {
            *range = None;
        }
    }
}
