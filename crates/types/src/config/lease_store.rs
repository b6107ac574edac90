//! Lease store configuration: extended-info tables, threading, paging.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::page::{LeasePageSize, MAX_LEASE_PAGE_SIZE};

/// Default upper bound on the number of leases returned by one page.
const fn default_max_page_size() -> usize {
    65_536
}

const fn default_extended_info_tables() -> bool {
    true
}

/// Locking discipline of the store.
///
/// Set once at startup by the embedding server. `SingleThreaded` promises that
/// at most one thread calls into the store at a time, so no lock is ever
/// waited on; `MultiThreaded` serializes mutations and lets reads share.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "kebab-case")]
pub enum ThreadingMode {
    /// One caller thread at a time; contention is a contract violation.
    #[default]
    SingleThreaded,
    /// Any number of caller threads.
    MultiThreaded,
}

impl ThreadingMode {
    /// Returns the mode matching a multi-threading flag.
    pub const fn from_multi_threaded(enabled: bool) -> Self {
        if enabled { ThreadingMode::MultiThreaded } else { ThreadingMode::SingleThreaded }
    }

    /// Returns `true` for [`ThreadingMode::MultiThreaded`].
    pub const fn is_multi_threaded(self) -> bool {
        matches!(self, ThreadingMode::MultiThreaded)
    }
}

impl fmt::Display for ThreadingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreadingMode::SingleThreaded => f.write_str("single-threaded"),
            ThreadingMode::MultiThreaded => f.write_str("multi-threaded"),
        }
    }
}

/// Lease store configuration.
///
/// # Validation Rules
///
/// - `max_page_size` must be between 1 and `u32::MAX`
///
/// # Example
///
/// ```no_run
/// # use lease6_types::config::{LeaseStoreConfig, ThreadingMode};
/// let config = LeaseStoreConfig::builder()
///     .extended_info_tables(true)
///     .threading_mode(ThreadingMode::MultiThreaded)
///     .build()
///     .expect("valid lease store config");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LeaseStoreConfig {
    /// Whether the relay-id and remote-id tables are maintained.
    ///
    /// When disabled, index additions and purges are no-ops and identifier
    /// queries return empty pages. Link queries are unaffected.
    #[serde(default = "default_extended_info_tables")]
    pub extended_info_tables: bool,
    /// Locking discipline. Default: single-threaded.
    #[serde(default)]
    pub threading_mode: ThreadingMode,
    /// Upper bound applied to requested page sizes. Default: 65536.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
}

#[bon::bon]
impl LeaseStoreConfig {
    /// Creates a new lease store configuration with validation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if `max_page_size` is 0 or larger
    /// than `u32::MAX`.
    #[builder]
    pub fn new(
        #[builder(default = default_extended_info_tables())] extended_info_tables: bool,
        #[builder(default)] threading_mode: ThreadingMode,
        #[builder(default = default_max_page_size())] max_page_size: usize,
    ) -> Result<Self, ConfigError> {
        let config = Self { extended_info_tables, threading_mode, max_page_size };
        config.validate()?;
        Ok(config)
    }
}

impl LeaseStoreConfig {
    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if any value is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_page_size == 0 || self.max_page_size > MAX_LEASE_PAGE_SIZE {
            return Err(ConfigError::Validation {
                message: format!(
                    "max_page_size must be 1-{}, got {}",
                    MAX_LEASE_PAGE_SIZE, self.max_page_size
                ),
            });
        }
        Ok(())
    }

    /// Returns `max_page_size` as a page size.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if the value is out of range, which
    /// only happens for a config that skipped [`validate`](Self::validate).
    pub fn max_page(&self) -> Result<LeasePageSize, ConfigError> {
        LeasePageSize::new(self.max_page_size).map_err(|e| ConfigError::Validation {
            message: format!("max_page_size: {e}"),
        })
    }
}

impl Default for LeaseStoreConfig {
    fn default() -> Self {
        Self {
            extended_info_tables: default_extended_info_tables(),
            threading_mode: ThreadingMode::default(),
            max_page_size: default_max_page_size(),
        }
    }
}
