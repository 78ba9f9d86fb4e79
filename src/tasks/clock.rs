//! Clock Refresh Task
//!
//! Keeps the cache's approximate clock close to wall-clock time. Runs on its
//! own thread so the clock keeps moving even when no async executor is being
//! driven.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{Receiver, RecvTimeoutError};
use tracing::debug;

use crate::cache::{Clock, CLOCK_REFRESH_INTERVAL};

/// Spawns a thread that refreshes `clock` every [`CLOCK_REFRESH_INTERVAL`].
///
/// The thread exits as soon as the sending side of `stop` is dropped or a
/// message arrives on it.
///
/// # Errors
/// Returns the OS error if the thread cannot be created.
pub(crate) fn spawn_clock_refresher(clock: Arc<Clock>, stop: Receiver<()>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("ttlcache-clock".to_string())
        .spawn(move || loop {
            match stop.recv_timeout(CLOCK_REFRESH_INTERVAL) {
                Err(RecvTimeoutError::Timeout) => clock.refresh(),
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    debug!("Clock refresher stopped");
                    break;
                }
            }
        })
}
