//! Shard Module
//!
//! One independently locked partition of the key space. Every operation holds
//! the shard lock for its whole duration: reads take the shared lock, writes
//! the exclusive one.
//!
//! Expiration is lazy. Reads treat expired entries as absent but never remove
//! them; physical removal happens only through `delete`, `pop` or `sweep`.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::cache::{CacheEntry, Value};

// == Numeric ==
/// Numeric types the increment operations understand.
trait Numeric: Copy {
    fn into_value<V>(self) -> Value<V>;
    fn slot<V>(value: &mut Value<V>) -> Option<&mut Self>;
    fn add(self, delta: Self) -> Self;
}

impl Numeric for isize {
    fn into_value<V>(self) -> Value<V> {
        Value::Int(self)
    }

    fn slot<V>(value: &mut Value<V>) -> Option<&mut Self> {
        match value {
            Value::Int(n) => Some(n),
            _ => None,
        }
    }

    fn add(self, delta: Self) -> Self {
        self.wrapping_add(delta)
    }
}

impl Numeric for i64 {
    fn into_value<V>(self) -> Value<V> {
        Value::Int64(self)
    }

    fn slot<V>(value: &mut Value<V>) -> Option<&mut Self> {
        match value {
            Value::Int64(n) => Some(n),
            _ => None,
        }
    }

    fn add(self, delta: Self) -> Self {
        self.wrapping_add(delta)
    }
}

impl Numeric for f64 {
    fn into_value<V>(self) -> Value<V> {
        Value::Float64(self)
    }

    fn slot<V>(value: &mut Value<V>) -> Option<&mut Self> {
        match value {
            Value::Float64(n) => Some(n),
            _ => None,
        }
    }

    fn add(self, delta: Self) -> Self {
        self + delta
    }
}

// == Shard ==
/// Lock-guarded table of entries for the keys routed to this shard.
#[derive(Debug)]
pub struct Shard<V> {
    items: RwLock<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> Shard<V> {
    // == Constructor ==
    /// Creates an empty shard whose table is pre-sized for `prealloc` entries.
    pub fn new(prealloc: usize) -> Self {
        Self {
            items: RwLock::new(HashMap::with_capacity(prealloc)),
        }
    }

    // == Get ==
    /// Returns a clone of the value if the key is live at `now`.
    pub fn get(&self, key: &str, now: i64) -> Option<Value<V>> {
        let items = self.items.read();
        items
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone())
    }

    // == Exists ==
    /// Checks whether the key is live at `now`.
    ///
    /// # Arguments
    /// * `key` - The key to look up
    /// * `now` - Current cached clock reading (Unix milliseconds)
    ///
    /// # Returns
    /// true if the key is present and not expired
    pub fn exists(&self, key: &str, now: i64) -> bool {
        let items = self.items.read();
        items.get(key).is_some_and(|entry| entry.is_live(now))
    }

    // == Time To Live ==
    /// Returns the remaining lifetime in milliseconds of a live key.
    pub fn ttl_remaining(&self, key: &str, now: i64) -> Option<i64> {
        let items = self.items.read();
        items
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.ttl_remaining_ms(now))
    }

    // == Set ==
    /// Stores the value unconditionally, replacing whatever was there.
    pub fn set(&self, key: String, value: Value<V>, expires_at: i64) {
        let mut items = self.items.write();
        items.insert(key, CacheEntry::new(value, expires_at));
    }

    // == Add ==
    /// Stores the value only if the key has no live entry.
    ///
    /// An expired entry still sitting in the table counts as free and is
    /// overwritten.
    pub fn add(&self, key: String, value: Value<V>, now: i64, expires_at: i64) -> bool {
        let mut items = self.items.write();
        if items.get(&key).is_some_and(|entry| entry.is_live(now)) {
            return false;
        }
        items.insert(key, CacheEntry::new(value, expires_at));
        true
    }

    // == Replace ==
    /// Overwrites value and expiration only if the key is live.
    pub fn replace(&self, key: &str, value: Value<V>, now: i64, expires_at: i64) -> bool {
        let mut items = self.items.write();
        match items.get_mut(key) {
            Some(entry) if entry.is_live(now) => {
                *entry = CacheEntry::new(value, expires_at);
                true
            }
            _ => false,
        }
    }

    // == Expire ==
    /// Moves the expiration of a live key, leaving its value untouched.
    pub fn expire(&self, key: &str, now: i64, expires_at: i64) -> bool {
        let mut items = self.items.write();
        match items.get_mut(key) {
            Some(entry) if entry.is_live(now) => {
                entry.expires_at = expires_at;
                true
            }
            _ => false,
        }
    }

    // == Pop ==
    /// Removes and returns a live entry in one critical section.
    ///
    /// An expired entry is not removed by a failed pop; the sweep gets it.
    pub fn pop(&self, key: &str, now: i64) -> Option<Value<V>> {
        let mut items = self.items.write();
        if !items.get(key).is_some_and(|entry| entry.is_live(now)) {
            return None;
        }
        items.remove(key).map(|entry| entry.value)
    }

    // == Delete ==
    /// Removes the key whether or not it is live. No-op if absent.
    pub fn delete(&self, key: &str) {
        let mut items = self.items.write();
        items.remove(key);
    }

    // == Increment ==
    /// Adds `delta` to a live `Int` entry, or creates one holding `delta`.
    ///
    /// # Arguments
    /// * `key` - The counter key
    /// * `delta` - Amount to add; integer overflow wraps
    /// * `now` - Current cached clock reading
    /// * `expires_at` - Deadline used only when the entry is (re)created
    ///
    /// # Returns
    /// The new value, or `None` if a live entry of another type holds the key
    pub fn increment_int(&self, key: &str, delta: isize, now: i64, expires_at: i64) -> Option<isize> {
        self.increment(key, delta, now, expires_at)
    }

    /// `Int64` counterpart of [`Shard::increment_int`].
    pub fn increment_int64(&self, key: &str, delta: i64, now: i64, expires_at: i64) -> Option<i64> {
        self.increment(key, delta, now, expires_at)
    }

    /// `Float64` counterpart of [`Shard::increment_int`].
    pub fn increment_float64(&self, key: &str, delta: f64, now: i64, expires_at: i64) -> Option<f64> {
        self.increment(key, delta, now, expires_at)
    }

    /// Adds `delta` to a live numeric entry of the same type, keeping its
    /// expiration. An absent or expired key is (re)created holding `delta`
    /// and expiring at `expires_at`. A live entry of another type is left
    /// alone and `None` is returned.
    fn increment<N: Numeric>(&self, key: &str, delta: N, now: i64, expires_at: i64) -> Option<N> {
        let mut items = self.items.write();
        if let Some(entry) = items.get_mut(key) {
            if entry.is_live(now) {
                let slot = N::slot(&mut entry.value)?;
                *slot = N::add(*slot, delta);
                return Some(*slot);
            }
        }
        items.insert(key.to_owned(), CacheEntry::new(delta.into_value(), expires_at));
        Some(delta)
    }

    // == Sweep ==
    /// Removes every entry expired at `now`.
    ///
    /// Returns the number of entries removed.
    pub fn sweep(&self, now: i64) -> usize {
        let mut items = self.items.write();
        let before = items.len();
        items.retain(|_, entry| !entry.is_expired(now));
        before - items.len()
    }

    // == Length ==
    /// Returns the number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}
