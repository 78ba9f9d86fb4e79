//! Cache Store Module
//!
//! The public cache: routes each key to its shard, stamps operations with the
//! approximate clock, and owns the background threads that keep the clock
//! fresh and reclaim expired entries.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::cache::{shard_index, Clock, Shard, Value};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::tasks::BackgroundTasks;

// == Cache Core ==
/// State shared between the cache handle and its background tasks.
#[derive(Debug)]
pub(crate) struct CacheCore<V> {
    pub(crate) shards: Box<[Shard<V>]>,
    pub(crate) clock: Arc<Clock>,
}

impl<V: Clone> CacheCore<V> {
    pub(crate) fn new(config: &CacheConfig) -> Self {
        let shards = (0..config.shard_count)
            .map(|_| Shard::new(config.shard_prealloc_size))
            .collect();
        Self {
            shards,
            clock: Arc::new(Clock::new()),
        }
    }

    #[inline]
    fn shard(&self, key: &str) -> &Shard<V> {
        &self.shards[shard_index(key, self.shards.len())]
    }
}

// == TTL Cache ==
/// Sharded in-process cache where every entry carries a time to live.
///
/// Operations are synchronous and may be called from any thread. Each one
/// locks only the shard its key hashes to. Expired entries disappear from
/// reads as soon as the cached clock passes their deadline and are freed by
/// the janitor on its next pass.
///
/// TTLs are whole seconds measured against a clock refreshed every 300 ms,
/// so an entry may live up to that much longer or shorter than requested.
///
/// The clock refresher and the janitor run on two dedicated threads, so the
/// cache works the same inside or outside an async runtime. They stop when
/// the cache is dropped or [`TtlCache::shutdown`] is called.
///
/// # Example
/// ```
/// # fn demo() -> ttlcache::Result<()> {
/// use ttlcache::{CacheConfig, TtlCache, Value};
///
/// let cache: TtlCache<String> = TtlCache::new(CacheConfig::default())?;
/// cache.set("session", "alice".to_string(), 30);
/// assert_eq!(cache.get("session"), Some(Value::Object("alice".to_string())));
/// # Ok(())
/// # }
/// # demo().unwrap();
/// ```
#[derive(Debug)]
pub struct TtlCache<V> {
    core: Arc<CacheCore<V>>,
    config: CacheConfig,
    tasks: BackgroundTasks,
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a cache and starts its clock refresher and janitor threads.
    ///
    /// # Arguments
    /// * `config` - Shard layout and janitor interval
    ///
    /// # Errors
    /// - `CacheError::InvalidConfig` if any config value is zero
    /// - `CacheError::Spawn` if a background thread cannot be started
    pub fn new(config: CacheConfig) -> Result<Self> {
        config.validate()?;

        let core = Arc::new(CacheCore::new(&config));
        let tasks = BackgroundTasks::spawn(core.clone(), config.clean_interval())?;

        info!(
            "TTL cache started: shards={}, prealloc={}, clean_interval={}s",
            config.shard_count, config.shard_prealloc_size, config.clean_interval_secs
        );

        Ok(Self {
            core,
            config,
            tasks,
        })
    }

    // == Set ==
    /// Stores a value, replacing any existing entry for the key.
    ///
    /// # Panics
    /// Panics if `ttl_secs` is zero.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value<V>>, ttl_secs: u64) {
        let key = key.into();
        let now = self.core.clock.now();
        let expires_at = expires_at("set", now, ttl_secs);
        self.core.shard(&key).set(key, value.into(), expires_at);
    }

    // == Get ==
    /// Returns the value if the key is present and not expired.
    pub fn get(&self, key: &str) -> Option<Value<V>> {
        self.core.shard(key).get(key, self.core.clock.now())
    }

    // == Exists ==
    /// Checks whether the key has a live entry.
    ///
    /// # Arguments
    /// * `key` - The key to look up
    ///
    /// # Returns
    /// true if the key is present and not expired
    pub fn exists(&self, key: &str) -> bool {
        self.core.shard(key).exists(key, self.core.clock.now())
    }

    // == Add ==
    /// Stores a value only if the key has no live entry.
    ///
    /// Returns false, leaving the cache unchanged, if a live entry exists.
    ///
    /// # Panics
    /// Panics if `ttl_secs` is zero.
    pub fn add(&self, key: impl Into<String>, value: impl Into<Value<V>>, ttl_secs: u64) -> bool {
        let key = key.into();
        let now = self.core.clock.now();
        let expires_at = expires_at("add", now, ttl_secs);
        self.core.shard(&key).add(key, value.into(), now, expires_at)
    }

    // == Replace ==
    /// Overwrites the value and TTL of a live key.
    ///
    /// Returns false, leaving the cache unchanged, if the key is absent or
    /// expired.
    ///
    /// # Panics
    /// Panics if `ttl_secs` is zero.
    pub fn replace(&self, key: &str, value: impl Into<Value<V>>, ttl_secs: u64) -> bool {
        let now = self.core.clock.now();
        let expires_at = expires_at("replace", now, ttl_secs);
        self.core.shard(key).replace(key, value.into(), now, expires_at)
    }

    // == Expire ==
    /// Resets the TTL of a live key without touching its value.
    ///
    /// # Panics
    /// Panics if `ttl_secs` is zero.
    pub fn expire(&self, key: &str, ttl_secs: u64) -> bool {
        let now = self.core.clock.now();
        let expires_at = expires_at("expire", now, ttl_secs);
        self.core.shard(key).expire(key, now, expires_at)
    }

    // == Pop ==
    /// Removes a live key and returns its value.
    pub fn pop(&self, key: &str) -> Option<Value<V>> {
        self.core.shard(key).pop(key, self.core.clock.now())
    }

    // == Delete ==
    /// Removes a key, live or not. Does nothing if the key is absent.
    pub fn delete(&self, key: &str) {
        self.core.shard(key).delete(key);
    }

    // == Increment ==
    /// Adds `delta` to an `Int` value and returns the result.
    ///
    /// An absent or expired key is created holding `delta` with the given TTL.
    /// For a live key the TTL is ignored and the existing expiration kept.
    /// Returns `None`, leaving the entry unchanged, if the live value is not
    /// an `Int`.
    ///
    /// # Panics
    /// Panics if `ttl_secs` is zero.
    pub fn increment_int(&self, key: &str, delta: isize, ttl_secs: u64) -> Option<isize> {
        let now = self.core.clock.now();
        let expires_at = expires_at("increment_int", now, ttl_secs);
        self.core.shard(key).increment_int(key, delta, now, expires_at)
    }

    /// Adds `delta` to an `Int64` value. Same rules as [`TtlCache::increment_int`].
    ///
    /// # Panics
    /// Panics if `ttl_secs` is zero.
    pub fn increment_int64(&self, key: &str, delta: i64, ttl_secs: u64) -> Option<i64> {
        let now = self.core.clock.now();
        let expires_at = expires_at("increment_int64", now, ttl_secs);
        self.core.shard(key).increment_int64(key, delta, now, expires_at)
    }

    /// Adds `delta` to a `Float64` value. Same rules as [`TtlCache::increment_int`].
    ///
    /// # Panics
    /// Panics if `ttl_secs` is zero.
    pub fn increment_float64(&self, key: &str, delta: f64, ttl_secs: u64) -> Option<f64> {
        let now = self.core.clock.now();
        let expires_at = expires_at("increment_float64", now, ttl_secs);
        self.core.shard(key).increment_float64(key, delta, now, expires_at)
    }

    // == Time To Live ==
    /// Returns how long a live key has left.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        self.core
            .shard(key)
            .ttl_remaining(key, self.core.clock.now())
            .map(|ms| Duration::from_millis(ms as u64))
    }

    // == Items ==
    /// Returns the number of stored entries across all shards.
    ///
    /// Includes expired entries the janitor has not reclaimed yet, and shards
    /// are counted one after another, so this is a diagnostic figure only.
    pub fn items(&self) -> usize {
        self.core.shards.iter().map(Shard::len).sum()
    }

    /// Returns true if no shard holds any entry, expired or not.
    pub fn is_empty(&self) -> bool {
        self.core.shards.iter().all(Shard::is_empty)
    }

    /// Returns the number of shards keys are spread over.
    pub fn shard_count(&self) -> usize {
        self.core.shards.len()
    }

    /// Returns the configuration the cache was built with.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    // == Shutdown ==
    /// Stops the background threads and waits for them to exit.
    ///
    /// Dropping the cache also stops them, without waiting.
    pub fn shutdown(self) {
        self.tasks.shutdown();
    }
}

/// Turns a TTL in seconds into an absolute deadline in Unix milliseconds.
fn expires_at(op: &str, now: i64, ttl_secs: u64) -> i64 {
    assert!(ttl_secs > 0, "TtlCache::{op}: ttl must be at least 1 second");
    let ttl_ms = i64::try_from(ttl_secs)
        .unwrap_or(i64::MAX)
        .saturating_mul(1_000);
    now.saturating_add(ttl_ms)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;

    fn test_cache() -> TtlCache<String> {
        TtlCache::new(CacheConfig::default().with_shard_count(8)).unwrap()
    }

    fn obj(s: &str) -> Value<String> {
        Value::Object(s.to_string())
    }

    #[test]
    fn test_expires_at() {
        assert_eq!(expires_at("set", 1_000, 1), 2_000);
        assert_eq!(expires_at("set", 1_000, 60), 61_000);
        assert_eq!(expires_at("set", 1_000, u64::MAX), i64::MAX);
    }

    #[test]
    #[should_panic(expected = "ttl must be at least 1 second")]
    fn test_expires_at_rejects_zero() {
        expires_at("set", 1_000, 0);
    }

    #[test]
    fn test_new_outside_runtime() {
        let cache: TtlCache<String> = TtlCache::new(CacheConfig::default()).unwrap();
        cache.set("key1", "value1".to_string(), 60);
        assert_eq!(cache.get("key1"), Some(obj("value1")));
        cache.shutdown();
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let result: Result<TtlCache<String>> =
            TtlCache::new(CacheConfig::default().with_shard_count(0));
        assert!(matches!(result, Err(CacheError::InvalidConfig { .. })));
    }

    #[test]
    fn test_shard_layout_follows_config() {
        let cache = test_cache();
        assert_eq!(cache.shard_count(), 8);
        assert_eq!(cache.config().shard_count, 8);
    }

    #[test]
    fn test_set_and_get() {
        let cache = test_cache();

        cache.set("key1", "value1".to_string(), 60);

        assert_eq!(cache.get("key1"), Some(obj("value1")));
        assert!(cache.exists("key1"));
        assert_eq!(cache.items(), 1);
    }

    #[test]
    fn test_get_nonexistent() {
        let cache = test_cache();

        assert_eq!(cache.get("nonexistent"), None);
        assert!(!cache.exists("nonexistent"));
    }

    #[test]
    fn test_add_and_replace() {
        let cache = test_cache();

        assert!(!cache.replace("key1", "value0".to_string(), 60));
        assert!(cache.add("key1", "value1".to_string(), 60));
        assert!(!cache.add("key1", "ignored".to_string(), 60));
        assert_eq!(cache.get("key1"), Some(obj("value1")));

        assert!(cache.replace("key1", "value2".to_string(), 60));
        assert_eq!(cache.get("key1"), Some(obj("value2")));
    }

    #[test]
    fn test_expire_changes_only_ttl() {
        let cache = test_cache();
        cache.set("key1", "value1".to_string(), 5);

        assert!(cache.expire("key1", 3_600));
        assert_eq!(cache.get("key1"), Some(obj("value1")));
        assert!(cache.ttl("key1").unwrap() > Duration::from_secs(3_000));

        assert!(!cache.expire("missing", 10));
    }

    #[test]
    fn test_pop_and_delete() {
        let cache = test_cache();
        cache.set("key1", "value1".to_string(), 60);
        cache.set("key2", "value2".to_string(), 60);

        assert_eq!(cache.pop("key1"), Some(obj("value1")));
        assert_eq!(cache.pop("key1"), None);

        cache.delete("key2");
        cache.delete("key2");
        assert_eq!(cache.get("key2"), None);
        assert_eq!(cache.items(), 0);
    }

    #[test]
    fn test_increments() {
        let cache = test_cache();

        assert_eq!(cache.increment_int("x", 1, 60), Some(1));
        assert_eq!(cache.increment_int("x", 1, 60), Some(2));
        assert_eq!(cache.increment_float64("x", 1.0, 60), None);
        assert_eq!(cache.get("x"), Some(Value::Int(2)));

        assert_eq!(cache.increment_int64("y", 40, 60), Some(40));
        assert_eq!(cache.increment_int64("y", 2, 60), Some(42));

        assert_eq!(cache.increment_float64("z", 0.5, 60), Some(0.5));
        assert_eq!(cache.increment_float64("z", 0.25, 60), Some(0.75));
    }

    #[test]
    fn test_set_numeric_then_increment() {
        let cache = test_cache();
        cache.set("n", Value::Int64(10), 60);

        assert_eq!(cache.increment_int64("n", 5, 60), Some(15));
        assert_eq!(cache.increment_int("n", 5, 60), None);
    }

    #[test]
    #[should_panic(expected = "TtlCache::add: ttl must be at least 1 second")]
    fn test_add_zero_ttl_panics() {
        let cache = test_cache();
        cache.add("key1", "value1".to_string(), 0);
    }

    #[test]
    fn test_shutdown_stops_tasks() {
        let cache = test_cache();
        cache.set("key1", "value1".to_string(), 60);

        let started = std::time::Instant::now();
        cache.shutdown();
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_is_empty() {
        let cache = test_cache();
        assert!(cache.is_empty());

        cache.set("key1", "value1".to_string(), 60);
        assert!(!cache.is_empty());

        cache.delete("key1");
        assert!(cache.is_empty());
    }
}
