//! Read Schema
//!
//! Column-projection descriptor carried by a scan request.
//!
//! ## Format
//! The descriptor uses the Parquet message-type text form:
//! ```text
//! message people {
//!   required binary rowkey;
//!   required binary cf:name;
//!   optional binary cf:age (UTF8);
//!   required int64 timestamp;
//! }
//! ```
//! Parsing is delegated to `parquet`. Only the top-level field names matter
//! to the memstore. A field name may carry a family prefix (`cf:`) which is
//! stripped to get the qualifier.

use bytes::Bytes;
use parquet::schema::parser::parse_message_type;
use parquet::schema::types::{Type, TypePtr};

use crate::error::{MemStoreError, Result};

/// Parsed read schema
#[derive(Debug, Clone, PartialEq)]
pub struct ReadSchema {
    message: Type,
}

impl ReadSchema {
    /// Parse a message-type descriptor
    pub fn parse(text: &str) -> Result<Self> {
        let message =
            parse_message_type(text).map_err(|e| MemStoreError::SchemaParse(e.to_string()))?;
        Ok(Self { message })
    }

    /// Message name
    pub fn name(&self) -> &str {
        self.message.name()
    }

    /// Top-level fields, nested groups included as a single field
    pub fn fields(&self) -> &[TypePtr] {
        self.message.get_fields()
    }

    /// Top-level field names as written
    pub fn field_names(&self) -> Vec<&str> {
        self.fields().iter().map(|f| f.name()).collect()
    }

    /// Qualifier names to project, with any `family<separator>` prefix removed
    pub fn projection_columns(&self, separator: char) -> Vec<Bytes> {
        self.fields()
            .iter()
            .map(|f| {
                let name = f.name();
                let qualifier = match name.split_once(separator) {
                    Some((_, qualifier)) => qualifier,
                    None => name,
                };
                Bytes::copy_from_slice(qualifier.as_bytes())
            })
            .collect()
    }
}
