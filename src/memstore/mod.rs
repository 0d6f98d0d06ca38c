//! MemStore Module
//!
//! In-memory buffer for the recent writes of one region.
//!
//! ## Responsibilities
//! - Buffer writes in a concurrent ordered row map, merging repeated
//!   writes to the same row
//! - Track size, oldest edit time and observed key range for flush policy
//! - Freeze the active map into a snapshot for the flush pipeline
//! - Hand out column-filtered row scanners over the active and snapshot maps
//!
//! ## Snapshot Lifecycle
//! ```text
//!            add/delete                 snapshot()              clear_snapshot(id)
//!   writes ─────────────▶ [ active ] ───────────────▶ [ snapshot ] ───────────────▶ dropped
//!                              ▲                            │
//!                              └── fresh empty map ◀────────┘
//! ```
//! Only one non-empty snapshot may be pending; `snapshot()` returns `None`
//! until the pending one is cleared.

mod key_range;
mod request;
mod row_map;
mod scanner;
mod snapshot;
mod store;

pub use key_range::{KeyRange, KeyRangeTracker};
pub use request::{ScanRequest, EMPTY_START_ROW};
pub use row_map::{RowMap, Upsert};
pub use scanner::{compare_scanners, ColumnFilter, RowScanner};
pub use snapshot::MemStoreSnapshot;
pub use store::{MemStore, DEEP_OVERHEAD, FIXED_OVERHEAD, ROW_MAP_OVERHEAD};

/// Why the flush policy wants a flush
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTrigger {
    /// Buffered data reached the configured size threshold
    Size,

    /// The oldest unflushed edit is older than the configured interval
    Age,
}
