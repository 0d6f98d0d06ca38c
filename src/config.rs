//! Configuration for the region memstore
//!
//! Centralized configuration with sensible defaults.

use crate::error::{MemStoreError, Result};

/// Main configuration for a memstore instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Flush Policy
    // -------------------------------------------------------------------------
    /// Buffered data size (in bytes, excluding fixed overhead) at which
    /// a size-triggered flush is due
    pub flush_size_threshold: u64,

    /// Maximum age of the oldest unflushed edit (milliseconds) before an
    /// age-triggered flush is due. `0` disables age flushes.
    pub flush_interval_ms: u64,

    // -------------------------------------------------------------------------
    // Scan Configuration
    // -------------------------------------------------------------------------
    /// What to do when a scan request carries a read schema that cannot be parsed
    pub schema_policy: SchemaPolicy,

    /// Separator between the family prefix and the qualifier in schema
    /// field names, e.g. `cf:age`
    pub family_separator: char,
}

/// Behaviour on a malformed read schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaPolicy {
    /// Log the parse failure and scan without a column filter
    FailOpen,

    /// Refuse to build the scanner
    Reject,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            flush_size_threshold: 128 * 1024 * 1024, // 128 MB
            flush_interval_ms: 60 * 60 * 1000,       // 1 hour
            schema_policy: SchemaPolicy::FailOpen,
            family_separator: ':',
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the configuration for values the memstore cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.flush_size_threshold == 0 {
            return Err(MemStoreError::Config(
                "flush_size_threshold must be greater than zero".to_string(),
            ));
        }
        if self.family_separator.is_whitespace() {
            return Err(MemStoreError::Config(format!(
                "family_separator {:?} cannot be whitespace",
                self.family_separator
            )));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the size flush threshold (in bytes)
    pub fn flush_size_threshold(mut self, bytes: u64) -> Self {
        self.config.flush_size_threshold = bytes;
        self
    }

    /// Set the age flush interval (in milliseconds)
    pub fn flush_interval_ms(mut self, ms: u64) -> Self {
        self.config.flush_interval_ms = ms;
        self
    }

    /// Set the malformed read schema policy
    pub fn schema_policy(mut self, policy: SchemaPolicy) -> Self {
        self.config.schema_policy = policy;
        self
    }

    /// Set the family/qualifier separator used in schema field names
    pub fn family_separator(mut self, separator: char) -> Self {
        self.config.family_separator = separator;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
