//! ttlcache - A sharded in-process key/value cache with TTL expiration
//!
//! Keys are spread over independently locked shards. Every entry carries an
//! absolute deadline checked against a cheap, periodically refreshed clock;
//! expired entries vanish from reads at once and are reclaimed by a
//! background janitor.
//!
//! Only the [`TtlCache`] facade and [`Value`] are exposed; shards and the
//! clock stay internal.
//!
//! ```compile_fail
//! use ttlcache::cache::Shard;
//! ```
//!
//! ```compile_fail
//! use ttlcache::cache::Clock;
//! ```

pub mod cache;
pub mod config;
pub mod error;
mod tasks;

pub use cache::{TtlCache, Value};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
