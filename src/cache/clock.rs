//! Approximate Clock Module
//!
//! A shared wall-clock timestamp refreshed on a fixed period by a background
//! thread, so cache operations never pay for a precise time read. Values may lag
//! real time by up to [`CLOCK_REFRESH_INTERVAL`]; TTLs are only as precise as
//! that.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use chrono::Utc;

/// How often the background refresher stores a fresh timestamp.
pub const CLOCK_REFRESH_INTERVAL: Duration = Duration::from_millis(300);

// == Clock ==
/// Single-writer, many-reader cached timestamp in Unix milliseconds.
#[derive(Debug)]
pub struct Clock {
    now_ms: AtomicI64,
}

impl Clock {
    /// Creates a clock primed with the current time.
    pub fn new() -> Self {
        Self {
            now_ms: AtomicI64::new(current_timestamp_ms()),
        }
    }

    /// Returns the cached timestamp.
    #[inline]
    pub fn now(&self) -> i64 {
        self.now_ms.load(Ordering::Relaxed)
    }

    /// Stores the current wall-clock time. Only the refresher thread calls this.
    pub fn refresh(&self) {
        self.now_ms.store(current_timestamp_ms(), Ordering::Relaxed);
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
fn current_timestamp_ms() -> i64 {
    Utc::now().timestamp_millis()
}
