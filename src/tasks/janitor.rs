//! Janitor Task
//!
//! Background thread that periodically removes expired entries from every
//! shard.

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{Receiver, RecvTimeoutError};
use tracing::{debug, info, warn};

use crate::cache::{CacheCore, Shard};

/// Spawns a thread that sweeps all shards every `clean_interval`.
///
/// The first sweep happens one full interval after start. Each pass reads the
/// cached clock once and sweeps the shards one after another. The thread
/// exits as soon as the sending side of `stop` is dropped.
///
/// # Arguments
/// * `core` - Shards and clock shared with the cache handle
/// * `clean_interval` - Time between two sweeps
/// * `stop` - Stop signal; disconnecting it ends the loop
///
/// # Errors
/// Returns the OS error if the thread cannot be created.
pub(crate) fn spawn_janitor<V>(
    core: Arc<CacheCore<V>>,
    clean_interval: Duration,
    stop: Receiver<()>,
) -> io::Result<JoinHandle<()>>
where
    V: Clone + Send + Sync + 'static,
{
    thread::Builder::new()
        .name("ttlcache-janitor".to_string())
        .spawn(move || {
            info!(
                "Starting janitor with interval of {} seconds",
                clean_interval.as_secs()
            );

            loop {
                match stop.recv_timeout(clean_interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        let now = core.clock.now();
                        let removed = sweep_shards(&core.shards, now);

                        if removed > 0 {
                            info!("Janitor: removed {} expired entries", removed);
                        } else {
                            debug!("Janitor: no expired entries found");
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                        debug!("Janitor stopped");
                        break;
                    }
                }
            }
        })
}

/// Sweeps every shard at `now` and returns the total number removed.
///
/// A panic while sweeping one shard (a value's `Drop`, say) is logged and the
/// remaining shards are still swept.
pub(crate) fn sweep_shards<V: Clone>(shards: &[Shard<V>], now: i64) -> usize {
    let mut removed = 0;
    for (idx, shard) in shards.iter().enumerate() {
        match panic::catch_unwind(AssertUnwindSafe(|| shard.sweep(now))) {
            Ok(count) => removed += count,
            Err(_) => warn!("Janitor: sweep of shard {} panicked, skipping it", idx),
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Value;
    use crate::config::CacheConfig;
    use crossbeam::channel::bounded;

    fn test_core() -> Arc<CacheCore<String>> {
        Arc::new(CacheCore::new(&CacheConfig::default().with_shard_count(4)))
    }

    #[test]
    fn test_sweep_shards_counts_across_shards() {
        let core = test_core();
        let now = core.clock.now();
        for (i, shard) in core.shards.iter().enumerate() {
            shard.set(format!("dead-{i}"), Value::Object("v".to_string()), now - 1);
            shard.set(format!("live-{i}"), Value::Object("v".to_string()), now + 60_000);
        }

        assert_eq!(sweep_shards(&core.shards, now), 4);
        assert!(core.shards.iter().all(|shard| shard.len() == 1));
    }

    #[derive(Clone)]
    struct PanicOnDrop;

    impl Drop for PanicOnDrop {
        fn drop(&mut self) {
            if !std::thread::panicking() {
                panic!("value drop failed");
            }
        }
    }

    #[test]
    fn test_sweep_continues_after_shard_panic() {
        let shards: Vec<Shard<PanicOnDrop>> = (0..3).map(|_| Shard::new(4)).collect();
        shards[0].set("bad".to_string(), Value::Object(PanicOnDrop), 0);
        shards[1].set("ok".to_string(), Value::Int(1), 0);
        shards[2].set("ok".to_string(), Value::Int(2), 0);

        let removed = sweep_shards(&shards, 10);

        assert_eq!(removed, 2);
        assert!(shards[1].is_empty());
        assert!(shards[2].is_empty());
    }

    #[test]
    fn test_janitor_removes_expired_entries() {
        let core = test_core();
        let now = core.clock.now();
        core.shards[0].set("expired".to_string(), Value::Object("v".to_string()), now - 1);
        core.shards[1].set("long_lived".to_string(), Value::Object("v".to_string()), now + 3_600_000);

        let (stop_tx, stop_rx) = bounded(1);
        let handle = spawn_janitor(core.clone(), Duration::from_secs(1), stop_rx).unwrap();

        // Wait for one sweep to run
        thread::sleep(Duration::from_millis(1500));

        assert!(core.shards[0].is_empty(), "Expired entry should have been swept");
        assert_eq!(core.shards[1].len(), 1, "Valid entry should not be removed");

        drop(stop_tx);
        handle.join().unwrap();
    }

    #[test]
    fn test_janitor_stops_when_signal_dropped() {
        let core = test_core();
        let (stop_tx, stop_rx) = bounded(1);
        let handle = spawn_janitor(core.clone(), Duration::from_secs(60), stop_rx).unwrap();

        drop(stop_tx);
        handle.join().unwrap();

        // The thread released its reference to the core
        assert_eq!(Arc::strong_count(&core), 1);
    }
}
