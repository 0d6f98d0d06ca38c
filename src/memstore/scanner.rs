//! Row scanner
//!
//! Forward, key-ordered iteration over one row map with an optional
//! column projection.
//!
//! ## Cursor Model
//! ```text
//!   rows:   k1   k2   k3   k4
//!                ^    ^
//!              curr  next
//! ```
//! `curr` is the row the next call to `next()` returns; `next` is a
//! one-row lookahead. `has_next()` and `peek()` only read `curr`, so they
//! may be called any number of times between advances.
//!
//! The scanner holds its own handle on the map it was built over. A
//! snapshot taken afterwards swaps the store's active map but leaves this
//! scanner reading the map it started on.

use std::cmp::Ordering;
use std::sync::Arc;

use bytes::Bytes;

use crate::config::{Config, SchemaPolicy};
use crate::error::Result;
use crate::mutation::Cell;
use crate::schema::ReadSchema;

use super::key_range::{KeyRange, KeyRangeTracker};
use super::request::ScanRequest;
use super::row_map::RowMap;

// =============================================================================
// Column Filter
// =============================================================================

/// Qualifier projection derived from a scan request's read schema
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnFilter {
    columns: Vec<Bytes>,
}

impl ColumnFilter {
    /// Filter that lets every cell through
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(columns: Vec<Bytes>) -> Self {
        Self { columns }
    }

    /// Build the filter for `scan`.
    ///
    /// A malformed schema is logged and yields an unfiltered scan under
    /// [`SchemaPolicy::FailOpen`], or is returned as an error under
    /// [`SchemaPolicy::Reject`].
    pub fn from_request(scan: &ScanRequest, config: &Config) -> Result<Self> {
        let schema = match scan.read_schema() {
            Some(s) if !s.trim().is_empty() => s,
            _ => return Ok(Self::all()),
        };

        match ReadSchema::parse(schema) {
            Ok(parsed) => Ok(Self::new(parsed.projection_columns(config.family_separator))),
            Err(e) => match config.schema_policy {
                SchemaPolicy::FailOpen => {
                    tracing::error!("Failed to parse read schema, scanning unfiltered: {}", e);
                    Ok(Self::all())
                }
                SchemaPolicy::Reject => Err(e),
            },
        }
    }

    pub fn columns(&self) -> &[Bytes] {
        &self.columns
    }

    pub fn is_unfiltered(&self) -> bool {
        self.columns.is_empty()
    }

    /// Whether `cell` survives the projection
    pub fn matches(&self, cell: &Cell) -> bool {
        self.columns.is_empty() || self.columns.iter().any(|c| cell.matches_qualifier(c))
    }
}

// =============================================================================
// Scanner
// =============================================================================

/// Where a scanner reports its key range from
pub(crate) enum RangeSource {
    /// The store's live tracker (active map scanners)
    Live(Arc<KeyRangeTracker>),

    /// Range captured when the map was frozen (snapshot scanners)
    Frozen(Option<KeyRange>),
}

/// Lazy forward iterator over the rows of one map
pub struct RowScanner {
    rows: Arc<RowMap>,
    curr: Option<Bytes>,
    next: Option<Bytes>,
    count_left: usize,
    filter: ColumnFilter,
    range: RangeSource,
}

impl RowScanner {
    /// Create a scanner positioned on the first row of `rows`
    pub(crate) fn new(rows: Arc<RowMap>, filter: ColumnFilter, range: RangeSource) -> Self {
        let count_left = rows.len();
        let mut scanner = Self {
            rows,
            curr: None,
            next: None,
            count_left,
            filter,
            range,
        };
        scanner.rewind();
        scanner
    }

    fn rewind(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        self.curr = self.rows.first_key();
        self.next = self.curr.as_ref().and_then(|c| self.rows.key_after(c));
    }

    /// Position on the first row `>= row`.
    ///
    /// The empty start row and an empty map leave the cursor where it is.
    /// If every row sorts before `row` the scanner is exhausted.
    pub fn seek(&mut self, row: &[u8]) {
        if row.is_empty() || self.rows.is_empty() {
            return;
        }
        self.curr = self.rows.key_at_or_after(row);
        self.next = self.curr.as_ref().and_then(|c| self.rows.key_after(c));
        self.count_left = match self.curr {
            Some(_) => self.rows.count_from(row),
            None => 0,
        };
    }

    pub fn has_next(&self) -> bool {
        self.curr.is_some() && !self.rows.is_empty()
    }

    /// Row key under the cursor
    pub fn current_row(&self) -> Option<&[u8]> {
        self.curr.as_deref()
    }

    /// Filtered cells of the row under the cursor, without advancing
    pub fn peek(&self) -> Vec<Cell> {
        match self.curr.as_ref() {
            Some(row) => self.collect_cells(row),
            None => Vec::new(),
        }
    }

    /// Release the cursor. Safe to call more than once.
    pub fn close(&mut self) {
        self.curr = None;
        self.next = None;
    }

    /// Total rows in the backing map
    pub fn record_count(&self) -> usize {
        self.rows.len()
    }

    /// Rows left to iterate
    pub fn max_results_count(&self) -> usize {
        self.count_left
    }

    pub fn start_key(&self) -> Option<Bytes> {
        match &self.range {
            RangeSource::Live(tracker) => tracker.start_key(),
            RangeSource::Frozen(range) => range.as_ref().map(|r| r.start().clone()),
        }
    }

    pub fn end_key(&self) -> Option<Bytes> {
        match &self.range {
            RangeSource::Live(tracker) => tracker.end_key(),
            RangeSource::Frozen(range) => range.as_ref().map(|r| r.end().clone()),
        }
    }

    pub fn filter(&self) -> &ColumnFilter {
        &self.filter
    }

    /// Copy out the cells of `row` that pass the filter.
    ///
    /// A malformed cell is logged and ends collection for the row; the
    /// cells gathered before it are kept.
    fn collect_cells(&self, row: &[u8]) -> Vec<Cell> {
        self.rows
            .with_row(row, |mutation| {
                let mut cells = Vec::with_capacity(mutation.len());
                for cell in mutation.cell_scanner() {
                    match cell {
                        Ok(cell) => {
                            if self.filter.matches(cell) {
                                cells.push(cell.clone());
                            }
                        }
                        Err(e) => {
                            tracing::error!("Error reading row {:?}: {}", String::from_utf8_lossy(row), e);
                            break;
                        }
                    }
                }
                cells
            })
            .unwrap_or_default()
    }
}

impl Iterator for RowScanner {
    type Item = Vec<Cell>;

    /// Return the filtered cells of the current row and advance.
    ///
    /// A row removed from the map after it was buffered yields an empty list.
    fn next(&mut self) -> Option<Self::Item> {
        if !self.has_next() {
            return None;
        }
        let row = self.curr.take()?;
        let cells = self.collect_cells(&row);

        self.curr = self.next.take();
        self.next = self.curr.as_ref().and_then(|c| self.rows.key_after(c));
        self.count_left = self.count_left.saturating_sub(1);

        Some(cells)
    }
}

impl std::fmt::Debug for RowScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowScanner")
            .field("curr", &self.curr)
            .field("count_left", &self.count_left)
            .field("filter", &self.filter)
            .finish()
    }
}

/// Order scanners by the row under their cursor, exhausted scanners last.
///
/// Used by the heap merge that combines snapshot and active scanners.
pub fn compare_scanners(a: &RowScanner, b: &RowScanner) -> Ordering {
    match (a.current_row(), b.current_row()) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
