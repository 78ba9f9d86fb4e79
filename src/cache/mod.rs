//! Cache Module
//!
//! Sharded in-memory storage with TTL expiration.

mod clock;
mod entry;
mod router;
mod shard;
mod store;


// Re-export public types
pub use entry::Value;
pub use store::TtlCache;

pub(crate) use clock::{Clock, CLOCK_REFRESH_INTERVAL};
pub(crate) use entry::CacheEntry;
pub(crate) use router::shard_index;
pub(crate) use shard::Shard;
pub(crate) use store::CacheCore;
