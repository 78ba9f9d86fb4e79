//! Error types for the cache
//!
//! Provides unified error handling using thiserror. Cache misses and unmet
//! preconditions are not errors; they are reported through `Option`/`bool`.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache construction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// A configuration value is out of range
    #[error("Invalid config: {field} must be greater than zero (got {value})")]
    InvalidConfig { field: &'static str, value: u64 },

    /// A background thread could not be started
    #[error("Failed to start background thread: {0}")]
    Spawn(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
