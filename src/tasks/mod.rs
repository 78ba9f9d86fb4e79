//! Background Tasks Module
//!
//! Contains the background work a cache runs for its whole lifetime.
//!
//! # Tasks
//! - Clock refresh: stores a fresh timestamp every 300 ms
//! - Janitor: removes expired entries at the configured interval
//!
//! Each task runs on a dedicated OS thread, so expiration keeps working no
//! matter how (or whether) the caller drives an async runtime. Both threads
//! listen on one stop channel held by [`BackgroundTasks`]; dropping it stops
//! them.

mod clock;
mod janitor;

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam::channel::{bounded, Sender};
use tracing::{debug, warn};

use crate::cache::CacheCore;
use crate::error::{CacheError, Result};

pub(crate) use clock::spawn_clock_refresher;
pub(crate) use janitor::spawn_janitor;

// == Background Tasks ==
/// Owns the running background threads of one cache.
#[derive(Debug)]
pub(crate) struct BackgroundTasks {
    /// Dropping the sender disconnects the channel and wakes both threads
    stop: Option<Sender<()>>,
    handles: Vec<JoinHandle<()>>,
}

impl BackgroundTasks {
    /// Starts the clock refresher and the janitor.
    ///
    /// # Errors
    /// Returns `CacheError::Spawn` if a thread cannot be created. Any thread
    /// already started is stopped again.
    pub(crate) fn spawn<V>(core: Arc<CacheCore<V>>, clean_interval: Duration) -> Result<Self>
    where
        V: Clone + Send + Sync + 'static,
    {
        let (stop, stop_rx) = bounded(1);
        let mut tasks = Self {
            stop: Some(stop),
            handles: Vec::with_capacity(2),
        };

        let clock = spawn_clock_refresher(core.clock.clone(), stop_rx.clone())
            .map_err(|err| CacheError::Spawn(err.to_string()))?;
        tasks.handles.push(clock);

        let janitor = spawn_janitor(core, clean_interval, stop_rx)
            .map_err(|err| CacheError::Spawn(err.to_string()))?;
        tasks.handles.push(janitor);

        Ok(tasks)
    }

    /// Stops the threads and waits for them to exit.
    pub(crate) fn shutdown(mut self) {
        self.stop.take();
        for handle in std::mem::take(&mut self.handles) {
            if handle.join().is_err() {
                warn!("Background thread ended abnormally");
            }
        }
        debug!("Background tasks shut down");
    }

    /// Returns true once the stop signal has been sent.
    #[cfg(test)]
    fn is_stopped(&self) -> bool {
        self.stop.is_none()
    }
}

impl Drop for BackgroundTasks {
    fn drop(&mut self) {
        self.stop.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use std::thread;

    #[test]
    fn test_drop_stops_tasks() {
        let core: Arc<CacheCore<String>> = Arc::new(CacheCore::new(&CacheConfig::default()));
        let tasks = BackgroundTasks::spawn(core.clone(), Duration::from_secs(1)).unwrap();
        assert!(!tasks.is_stopped());
        assert_eq!(Arc::strong_count(&core), 2);

        drop(tasks);

        // The janitor releases its reference to the core once it exits
        for _ in 0..50 {
            if Arc::strong_count(&core) == 1 {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(Arc::strong_count(&core), 1);
    }

    #[test]
    fn test_shutdown_joins_tasks() {
        let core: Arc<CacheCore<String>> = Arc::new(CacheCore::new(&CacheConfig::default()));
        let tasks = BackgroundTasks::spawn(core.clone(), Duration::from_secs(60)).unwrap();

        tasks.shutdown();
        assert_eq!(Arc::strong_count(&core), 1);
    }
}
