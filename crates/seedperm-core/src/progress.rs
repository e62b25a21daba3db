//! Periodic progress reporting on a side thread

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use tracing::info;

use crate::error::SearchError;
use crate::stats::SearchStats;

/// Background reporter. Reads only atomics, so it never contends with workers.
///
/// Dropping the handle (or calling [`ProgressReporter::stop`]) disconnects the
/// stop channel, which wakes the thread immediately; it is then joined.
pub struct ProgressReporter {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ProgressReporter {
    /// Log a progress line through `tracing` every `interval`
    pub fn spawn(stats: Arc<SearchStats>, interval: Duration) -> Result<Self, SearchError> {
        Self::spawn_with(stats, interval, log_progress)
    }

    /// Call `sink` with the live stats every `interval`
    pub fn spawn_with<F>(stats: Arc<SearchStats>, interval: Duration, mut sink: F) -> Result<Self, SearchError>
    where
        F: FnMut(&SearchStats) + Send + 'static,
    {
        let (stop_tx, stop_rx) = bounded::<()>(0);

        let handle = thread::Builder::new()
            .name("seedperm-progress".to_string())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => sink(&stats),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })
            .map_err(|e| SearchError::Spawn(e.to_string()))?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Tear the reporter down and wait for its thread to exit
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        drop(self.stop_tx.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.shutdown();
    }
}

pub(crate) fn log_progress(stats: &SearchStats) {
    info!(checked = stats.total_checked(), "{}", stats.format());
}
