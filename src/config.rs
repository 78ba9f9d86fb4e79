//! Configuration Module
//!
//! Handles cache configuration: defaults, builder-style overrides, loading
//! from environment variables, and validation.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

/// Default number of shards
pub const DEFAULT_SHARD_COUNT: usize = 128;
/// Default initial capacity of each shard's table
pub const DEFAULT_SHARD_PREALLOC_SIZE: usize = 128;
/// Default janitor period in seconds
pub const DEFAULT_CLEAN_INTERVAL_SECS: u64 = 10;

/// Cache configuration parameters.
///
/// Immutable once a cache has been built from it. Every value must be
/// greater than zero; [`CacheConfig::validate`] enforces this and cache
/// construction refuses invalid configs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Number of independently locked shards
    pub shard_count: usize,
    /// Initial capacity hint for each shard's table
    pub shard_prealloc_size: usize,
    /// Janitor sweep period in seconds
    pub clean_interval_secs: u64,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// Unset or unparsable variables keep their default.
    ///
    /// # Environment Variables
    /// - `TTLCACHE_SHARD_COUNT` - Number of shards (default: 128)
    /// - `TTLCACHE_SHARD_PREALLOC_SIZE` - Per-shard capacity hint (default: 128)
    /// - `TTLCACHE_CLEAN_INTERVAL` - Janitor period in seconds (default: 10)
    pub fn from_env() -> Self {
        Self {
            shard_count: env::var("TTLCACHE_SHARD_COUNT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SHARD_COUNT),
            shard_prealloc_size: env::var("TTLCACHE_SHARD_PREALLOC_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SHARD_PREALLOC_SIZE),
            clean_interval_secs: env::var("TTLCACHE_CLEAN_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_CLEAN_INTERVAL_SECS),
        }
    }

    /// Sets the number of shards.
    ///
    /// More shards means fewer callers competing for the same lock.
    pub fn with_shard_count(mut self, shard_count: usize) -> Self {
        self.shard_count = shard_count;
        self
    }

    /// Sets the initial capacity of each shard's table.
    pub fn with_shard_prealloc_size(mut self, shard_prealloc_size: usize) -> Self {
        self.shard_prealloc_size = shard_prealloc_size;
        self
    }

    /// Sets the janitor sweep period in seconds.
    pub fn with_clean_interval_secs(mut self, clean_interval_secs: u64) -> Self {
        self.clean_interval_secs = clean_interval_secs;
        self
    }

    /// Janitor sweep period as a Duration.
    pub fn clean_interval(&self) -> Duration {
        Duration::from_secs(self.clean_interval_secs)
    }

    /// Checks that every value is greater than zero.
    pub fn validate(&self) -> Result<()> {
        if self.shard_count == 0 {
            return Err(CacheError::InvalidConfig {
                field: "shard_count",
                value: 0,
            });
        }
        if self.shard_prealloc_size == 0 {
            return Err(CacheError::InvalidConfig {
                field: "shard_prealloc_size",
                value: 0,
            });
        }
        if self.clean_interval_secs == 0 {
            return Err(CacheError::InvalidConfig {
                field: "clean_interval_secs",
                value: 0,
            });
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            shard_count: DEFAULT_SHARD_COUNT,
            shard_prealloc_size: DEFAULT_SHARD_PREALLOC_SIZE,
            clean_interval_secs: DEFAULT_CLEAN_INTERVAL_SECS,
        }
    }
}
