use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::warn;

use super::notify::{NotificationSink, ProgressCounters};

/// Emits `progress` on a fixed period, independent of how fast records arrive.
///
/// Stopping (explicitly or by drop) joins the ticker thread, so no progress
/// signal can fire after `stop` returns.
pub(crate) struct ProgressTicker {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ProgressTicker {
    pub(crate) fn start(
        interval: Duration,
        sink: Arc<dyn NotificationSink>,
        counters: Arc<ProgressCounters>,
    ) -> Self {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let spawned = thread::Builder::new()
            .name("catalog-progress".into())
            .spawn(move || {
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => sink.progress(counters.snapshot()),
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            });

        let handle = match spawned {
            Ok(handle) => Some(handle),
            Err(err) => {
                // Progress is advisory; the cycle runs without it.
                warn!(error = %err, "could not start progress ticker");
                None
            }
        };

        Self {
            stop: Some(stop_tx),
            handle,
        }
    }

    pub(crate) fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        drop(self.stop.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("progress ticker panicked");
            }
        }
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
