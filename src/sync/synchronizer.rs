use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::error::RefreshError;
use crate::library::{CatalogStore, Song};

use super::filter::FilterPattern;
use super::notify::{NotificationSink, ProgressCounters, RefreshSummary};
use super::source::{
    ExtendedMetadata, FilterPatternProvider, ListenerId, RecordEnumerator, SettingKey,
};
use super::ticker::ProgressTicker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Refreshing,
}

/// What a refresh trigger did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshStatus {
    /// A new cycle was started on a worker thread.
    Started,
    /// A cycle was already running; this trigger was absorbed by it.
    Coalesced,
    /// The synchronizer is shutting down, or the worker thread could not be
    /// spawned (a `failed` signal was emitted in that case).
    Unavailable,
}

struct Shared {
    store: Arc<CatalogStore>,
    enumerator: Arc<dyn RecordEnumerator>,
    filter: Arc<dyn FilterPatternProvider>,
    sink: Arc<dyn NotificationSink>,
    progress_interval: Duration,
    refreshing: AtomicBool,
    cancel: AtomicBool,
    closed: AtomicBool,
    worker: Mutex<Option<JoinHandle<()>>>,
}

/// Marks the end of a cycle, at the latest when it unwinds.
struct CycleGuard<'a> {
    shared: &'a Shared,
    armed: bool,
}

impl<'a> CycleGuard<'a> {
    fn new(shared: &'a Shared) -> Self {
        Self {
            shared,
            armed: true,
        }
    }

    /// Refreshing -> Idle. Later calls do nothing.
    fn end(&mut self) {
        if self.armed {
            self.armed = false;
            self.shared.refreshing.store(false, Ordering::Release);
        }
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.end();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    /// Idle -> Refreshing. The caller owns ending the cycle.
    fn try_begin(&self) -> bool {
        let begun = self
            .refreshing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if begun {
            self.cancel.store(false, Ordering::Release);
        }
        begun
    }

    fn spawn_refresh(shared: &Arc<Shared>) -> RefreshStatus {
        let mut worker = lock(&shared.worker);
        if shared.closed.load(Ordering::Acquire) {
            return RefreshStatus::Unavailable;
        }

        if !shared.try_begin() {
            debug!("catalog refresh already running, coalescing trigger");
            return RefreshStatus::Coalesced;
        }

        let cycle = Arc::clone(shared);
        let spawned = thread::Builder::new()
            .name("catalog-refresh".into())
            .spawn(move || {
                let mut guard = CycleGuard::new(&cycle);
                let _ = cycle.run_cycle(&mut guard);
            });

        match spawned {
            Ok(handle) => {
                *worker = Some(handle);
                RefreshStatus::Started
            }
            Err(err) => {
                shared.refreshing.store(false, Ordering::Release);
                error!(error = %err, "could not spawn catalog refresh worker");
                shared
                    .sink
                    .failed(Arc::new(RefreshError::Worker(err.to_string())));
                RefreshStatus::Unavailable
            }
        }
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }

    /// Runs one cycle. The state is back to Idle before the terminal signal,
    /// so its handlers may trigger the next cycle.
    fn run_cycle(
        &self,
        guard: &mut CycleGuard<'_>,
    ) -> Result<RefreshSummary, Arc<RefreshError>> {
        let started = Instant::now();
        let pattern = self.filter.songs_filter_pattern();
        let filter = FilterPattern::resolve(pattern.as_deref());
        info!(
            filter = ?filter.as_ref().map(FilterPattern::as_str),
            "catalog refresh started"
        );

        let counters = Arc::new(ProgressCounters::default());
        let ticker = ProgressTicker::start(
            self.progress_interval,
            Arc::clone(&self.sink),
            Arc::clone(&counters),
        );

        match self.collect(filter.as_ref(), &counters) {
            Ok(songs) => {
                let admitted = songs.len();
                self.store.replace_all(songs);
                ticker.stop();
                guard.end();

                let summary = RefreshSummary {
                    scanned: counters.snapshot().scanned,
                    admitted,
                    elapsed: started.elapsed(),
                };
                info!(
                    scanned = summary.scanned,
                    admitted = summary.admitted,
                    elapsed_ms = summary.elapsed.as_millis() as u64,
                    "catalog refresh completed"
                );
                self.sink.completed(summary);
                Ok(summary)
            }
            Err(err) => {
                ticker.stop();
                guard.end();
                match &err {
                    RefreshError::Cancelled => info!("catalog refresh cancelled"),
                    other => warn!(error = %other, "catalog refresh failed, keeping previous snapshot"),
                }
                let cause = Arc::new(err);
                self.sink.failed(Arc::clone(&cause));
                Err(cause)
            }
        }
    }

    fn collect(
        &self,
        filter: Option<&FilterPattern>,
        counters: &ProgressCounters,
    ) -> Result<Vec<Song>, RefreshError> {
        let mut songs = Vec::new();

        for record in self.enumerator.records()? {
            if self.cancelled() {
                return Err(RefreshError::Cancelled);
            }
            let record = record?;
            counters.record_scanned();

            if filter.is_some_and(|f| !f.is_match(&record.path)) {
                continue;
            }

            let extended = match self.enumerator.extended_metadata(&record) {
                Ok(extended) => extended,
                Err(err) => {
                    debug!(path = %record.path, error = %err, "extended metadata unavailable");
                    ExtendedMetadata::default()
                }
            };
            songs.push(Song::from_record(record, extended));
            counters.record_admitted();
        }

        if self.cancelled() {
            return Err(RefreshError::Cancelled);
        }
        Ok(songs)
    }
}

/// Rebuilds the [`CatalogStore`] from a [`RecordEnumerator`].
///
/// At most one cycle runs at a time; triggers that arrive mid-cycle are
/// coalesced into it. A cycle publishes its snapshot in one swap and then
/// emits exactly one `completed`, or emits exactly one `failed` and leaves
/// the previous snapshot in place.
///
/// Changing the songs filter pattern on the provider triggers a refresh for
/// as long as the synchronizer is alive.
pub struct CatalogSynchronizer {
    shared: Arc<Shared>,
    listener: Option<ListenerId>,
}

impl CatalogSynchronizer {
    pub fn new(
        store: Arc<CatalogStore>,
        enumerator: Arc<dyn RecordEnumerator>,
        filter: Arc<dyn FilterPatternProvider>,
        sink: Arc<dyn NotificationSink>,
        progress_interval: Duration,
    ) -> Self {
        let shared = Arc::new(Shared {
            store,
            enumerator,
            filter: Arc::clone(&filter),
            sink,
            progress_interval,
            refreshing: AtomicBool::new(false),
            cancel: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            worker: Mutex::new(None),
        });

        let weak = Arc::downgrade(&shared);
        let listener = filter.add_listener(Box::new(move |key: &SettingKey| {
            if *key != SettingKey::SongsFilterPattern {
                return;
            }
            if let Some(shared) = weak.upgrade() {
                debug!("songs filter pattern changed, refreshing catalog");
                Shared::spawn_refresh(&shared);
            }
        }));

        Self {
            shared,
            listener: Some(listener),
        }
    }

    /// Start a background cycle unless one is already running.
    pub fn refresh(&self) -> RefreshStatus {
        Shared::spawn_refresh(&self.shared)
    }

    /// Run a cycle on the calling thread.
    ///
    /// Fails with [`RefreshError::AlreadyRunning`] without signalling when a
    /// cycle is in flight.
    pub fn refresh_blocking(&self) -> Result<RefreshSummary, Arc<RefreshError>> {
        let mut guard = {
            let _worker = lock(&self.shared.worker);
            if self.shared.closed.load(Ordering::Acquire) {
                return Err(Arc::new(RefreshError::Cancelled));
            }
            if !self.shared.try_begin() {
                return Err(Arc::new(RefreshError::AlreadyRunning));
            }
            CycleGuard::new(&self.shared)
        };
        self.shared.run_cycle(&mut guard)
    }

    pub fn state(&self) -> SyncState {
        if self.is_refreshing() {
            SyncState::Refreshing
        } else {
            SyncState::Idle
        }
    }

    pub fn is_refreshing(&self) -> bool {
        self.shared.refreshing.load(Ordering::Acquire)
    }

    /// Abort the running cycle, if any. The current snapshot stays.
    ///
    /// Cycles begin under the worker lock and clear the flag as they do, so
    /// a cancel that finds no cycle running cannot reach the next one.
    pub fn cancel(&self) {
        let _worker = lock(&self.shared.worker);
        if self.is_refreshing() {
            self.shared.cancel.store(true, Ordering::Release);
        }
    }

    /// Block until the most recently started background cycle has finished.
    pub fn wait_idle(&self) {
        let handle = lock(&self.shared.worker).take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("catalog refresh worker panicked");
            }
        }
    }
}

impl Drop for CatalogSynchronizer {
    fn drop(&mut self) {
        if let Some(id) = self.listener.take() {
            self.shared.filter.remove_listener(id);
        }
        {
            let _worker = lock(&self.shared.worker);
            self.shared.closed.store(true, Ordering::Release);
            self.shared.cancel.store(true, Ordering::Release);
        }
        self.wait_idle();
    }
}
