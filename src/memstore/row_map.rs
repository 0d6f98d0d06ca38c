//! Row map
//!
//! Concurrent ordered map from row key to pending mutation.
//!
//! Keys are ordered byte-wise (unsigned lexicographic), which is the
//! natural `Ord` of `Bytes`. Each value sits behind its own lock so a
//! repeated write can merge into the buffered mutation in place.

use std::ops::Bound;

use bytes::Bytes;
use crossbeam_skiplist::SkipMap;
use parking_lot::RwLock;

use crate::error::Result;
use crate::mutation::Mutation;

/// Outcome of [`RowMap::upsert`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Upsert {
    /// The row was newly created
    pub inserted: bool,
    /// Estimated size of the row before the write (0 when inserted)
    pub before: u64,
    /// Estimated size of the row after the write
    pub after: u64,
}

/// Ordered, concurrently writable row map
#[derive(Default)]
pub struct RowMap {
    rows: SkipMap<Bytes, RwLock<Mutation>>,
}

impl RowMap {
    pub fn new() -> Self {
        Self {
            rows: SkipMap::new(),
        }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Copy of the mutation buffered for `row`
    pub fn get(&self, row: &[u8]) -> Option<Mutation> {
        self.rows.get(row).map(|entry| entry.value().read().clone())
    }

    /// Run `f` against the mutation buffered for `row` without copying it
    pub fn with_row<R>(&self, row: &[u8], f: impl FnOnce(&Mutation) -> R) -> Option<R> {
        self.rows.get(row).map(|entry| f(&entry.value().read()))
    }

    /// Insert `mutation`, or merge it into the one already buffered at its row.
    pub fn upsert(&self, mutation: Mutation) -> Result<Upsert> {
        if let Some(entry) = self.rows.get(mutation.row()) {
            let mut existing = entry.value().write();
            return merge_into(&mut existing, mutation);
        }

        // Two writers may race to create the same row; the loser merges.
        let key = mutation.row_bytes();
        let fresh_size = mutation.heap_size();
        let mut incoming = mutation;
        let mut inserted = false;
        let entry = self.rows.get_or_insert_with(key, || {
            inserted = true;
            RwLock::new(std::mem::replace(&mut incoming, Mutation::put(Bytes::new())))
        });
        if inserted {
            return Ok(Upsert {
                inserted: true,
                before: 0,
                after: fresh_size,
            });
        }
        let mut existing = entry.value().write();
        merge_into(&mut existing, incoming)
    }

    /// Remove the row, returning what was buffered for it
    pub fn remove(&self, row: &[u8]) -> Option<Mutation> {
        self.rows.remove(row).map(|entry| entry.value().read().clone())
    }

    // =========================================================================
    // Ordered Key Access
    // =========================================================================

    /// Smallest row key
    pub fn first_key(&self) -> Option<Bytes> {
        self.rows.front().map(|entry| entry.key().clone())
    }

    /// Smallest row key `>= row`
    pub fn key_at_or_after(&self, row: &[u8]) -> Option<Bytes> {
        self.rows
            .lower_bound(Bound::Included(row))
            .map(|entry| entry.key().clone())
    }

    /// Smallest row key `> row`
    pub fn key_after(&self, row: &[u8]) -> Option<Bytes> {
        self.rows
            .lower_bound(Bound::Excluded(row))
            .map(|entry| entry.key().clone())
    }

    /// Number of rows with key `>= row`
    pub fn count_from(&self, row: &[u8]) -> usize {
        self.rows
            .range::<[u8], _>((Bound::Included(row), Bound::Unbounded))
            .count()
    }

    /// Visit every row in key order
    pub fn for_each(&self, mut f: impl FnMut(&Bytes, &Mutation)) {
        for entry in self.rows.iter() {
            f(entry.key(), &entry.value().read());
        }
    }
}

fn merge_into(existing: &mut Mutation, incoming: Mutation) -> Result<Upsert> {
    let before = existing.heap_size();
    existing.merge(incoming)?;
    Ok(Upsert {
        inserted: false,
        before,
        after: existing.heap_size(),
    })
}
