//! Cache Entry Module
//!
//! Defines stored values and individual cache entries with an absolute
//! expiration timestamp.

// == Value ==
/// A value held by the cache.
///
/// `Object` carries the caller's payload type. The numeric variants are what
/// the increment operations work on; an increment only succeeds against the
/// variant matching its own type.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<V> {
    /// Platform-sized signed integer
    Int(isize),
    /// 64-bit signed integer
    Int64(i64),
    /// 64-bit float
    Float64(f64),
    /// Arbitrary payload
    Object(V),
}

impl<V> Value<V> {
    /// Returns the payload if this is an `Object`.
    pub fn into_object(self) -> Option<V> {
        match self {
            Value::Object(v) => Some(v),
            _ => None,
        }
    }

    /// Borrows the payload if this is an `Object`.
    pub fn as_object(&self) -> Option<&V> {
        match self {
            Value::Object(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the number if this is an `Int`.
    pub fn as_int(&self) -> Option<isize> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the number if this is an `Int64`.
    pub fn as_int64(&self) -> Option<i64> {
        match self {
            Value::Int64(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the number if this is a `Float64`.
    pub fn as_float64(&self) -> Option<f64> {
        match self {
            Value::Float64(n) => Some(*n),
            _ => None,
        }
    }
}

impl<V> From<V> for Value<V> {
    fn from(value: V) -> Self {
        Value::Object(value)
    }
}

// == Cache Entry ==
/// A stored value together with the instant it stops being visible.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: Value<V>,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: i64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `expires_at` - Last instant the entry is visible (Unix milliseconds)
    pub fn new(value: Value<V>, expires_at: i64) -> Self {
        Self { value, expires_at }
    }

    // == Is Live ==
    /// Checks if the entry is still visible at `now`.
    ///
    /// Boundary condition: an entry is live up to and including its
    /// expiration instant, and expired strictly after it.
    pub fn is_live(&self, now: i64) -> bool {
        now <= self.expires_at
    }

    // == Is Expired ==
    /// Checks if the entry has passed its expiration instant at `now`.
    ///
    /// # Returns
    /// true when `now` is strictly after `expires_at`
    pub fn is_expired(&self, now: i64) -> bool {
        !self.is_live(now)
    }

    // == Time To Live ==
    /// Returns remaining lifetime in milliseconds at `now`, or 0 once expired.
    pub fn ttl_remaining_ms(&self, now: i64) -> i64 {
        (self.expires_at - now).max(0)
    }
}
