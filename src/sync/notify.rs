//! Refresh notifications and their fan-out.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::error::RefreshError;

/// Counts observed so far in the running cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshProgress {
    pub scanned: usize,
    pub admitted: usize,
}

/// Outcome of a cycle that published a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSummary {
    pub scanned: usize,
    pub admitted: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub enum CatalogEvent {
    Progress(RefreshProgress),
    Completed(RefreshSummary),
    Failed(Arc<RefreshError>),
}

impl CatalogEvent {
    /// `true` for the single event that ends a cycle.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CatalogEvent::Progress(_))
    }
}

/// Receives refresh signals. Implementations must not block for long.
pub trait NotificationSink: Send + Sync {
    fn progress(&self, progress: RefreshProgress);

    fn completed(&self, summary: RefreshSummary);

    fn failed(&self, cause: Arc<RefreshError>);
}

/// Channel fan-out: every subscriber gets its own receiver.
///
/// Dispatch only enqueues, so a slow subscriber never holds up the sender.
/// Subscribers whose receiver was dropped are pruned on the next dispatch.
#[derive(Debug)]
pub struct EventBus<T> {
    subscribers: Mutex<Vec<Sender<T>>>,
}

impl<T> Default for EventBus<T> {
    fn default() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }
}

impl<T: Clone> EventBus<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<T> {
        let (tx, rx) = mpsc::channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    pub fn dispatch(&self, event: T) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl NotificationSink for EventBus<CatalogEvent> {
    fn progress(&self, progress: RefreshProgress) {
        self.dispatch(CatalogEvent::Progress(progress));
    }

    fn completed(&self, summary: RefreshSummary) {
        self.dispatch(CatalogEvent::Completed(summary));
    }

    fn failed(&self, cause: Arc<RefreshError>) {
        self.dispatch(CatalogEvent::Failed(cause));
    }
}

/// Live counters shared between the enumeration loop and the ticker.
#[derive(Debug, Default)]
pub(crate) struct ProgressCounters {
    scanned: AtomicUsize,
    admitted: AtomicUsize,
}

impl ProgressCounters {
    pub(crate) fn record_scanned(&self) {
        self.scanned.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_admitted(&self) {
        self.admitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> RefreshProgress {
        RefreshProgress {
            scanned: self.scanned.load(Ordering::Relaxed),
            admitted: self.admitted.load(Ordering::Relaxed),
        }
    }
}
