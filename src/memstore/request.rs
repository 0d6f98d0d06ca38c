//! Scan request
//!
//! Read descriptor handed to the memstore. Only `read_schema` is consumed
//! by the scanners themselves; start/stop bounds and caching are enforced
//! by the caller's scan execution layer.

use bytes::Bytes;

/// Lower bound meaning "start from the first row"
pub const EMPTY_START_ROW: &[u8] = &[];

/// Read descriptor for a region scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanRequest {
    start_row: Option<Bytes>,
    stop_row: Option<Bytes>,
    caching: Option<usize>,
    read_schema: Option<String>,
}

impl ScanRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start_row(mut self, row: impl Into<Bytes>) -> Self {
        self.start_row = Some(row.into());
        self
    }

    pub fn with_stop_row(mut self, row: impl Into<Bytes>) -> Self {
        self.stop_row = Some(row.into());
        self
    }

    /// Rows per batch hint
    pub fn with_caching(mut self, rows: usize) -> Self {
        self.caching = Some(rows);
        self
    }

    /// Column projection in message-type text form, see [`crate::schema`]
    pub fn with_read_schema(mut self, schema: impl Into<String>) -> Self {
        self.read_schema = Some(schema.into());
        self
    }

    /// Start row, or [`EMPTY_START_ROW`] when unbounded
    pub fn start_row(&self) -> &[u8] {
        self.start_row.as_deref().unwrap_or(EMPTY_START_ROW)
    }

    /// Exclusive stop row. Scanners do not enforce it; the scan execution
    /// layer stops reading once a row reaches it.
    pub fn stop_row(&self) -> Option<&[u8]> {
        self.stop_row.as_deref()
    }

    /// Rows to fetch per batch, for the scan execution layer
    pub fn caching(&self) -> Option<usize> {
        self.caching
    }

    pub fn read_schema(&self) -> Option<&str> {
        self.read_schema.as_deref()
    }
}
