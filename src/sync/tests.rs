use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use super::*;
use crate::error::{EnumerationError, MetadataError, RefreshError};
use crate::library::{CatalogStore, Song};
use crate::settings::SettingsStore;

fn record(id: u64, path: &str) -> RawRecord {
    RawRecord {
        id,
        title: format!("song {id}"),
        filename: path.rsplit('/').next().unwrap_or(path).to_string(),
        path: path.to_string(),
        ..RawRecord::default()
    }
}

/// Parks the first record until released, so a test can act mid-cycle.
struct Hold {
    reached: Mutex<Sender<()>>,
    release: Mutex<Receiver<()>>,
}

#[derive(Default)]
struct FakeSource {
    records: Vec<RawRecord>,
    fail_open: AtomicBool,
    fail_at: Option<usize>,
    metadata_fails: bool,
    per_record_delay: Duration,
    hold: Option<Hold>,
    opened: AtomicUsize,
}

impl FakeSource {
    fn with(records: Vec<RawRecord>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    /// Returns the source plus (reached, release) handles for the held record.
    fn held(records: Vec<RawRecord>) -> (Self, Receiver<()>, Sender<()>) {
        let (reached_tx, reached_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let source = Self {
            records,
            hold: Some(Hold {
                reached: Mutex::new(reached_tx),
                release: Mutex::new(release_rx),
            }),
            ..Self::default()
        };
        (source, reached_rx, release_tx)
    }

    fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

impl RecordEnumerator for FakeSource {
    fn records(&self) -> Result<RecordStream<'_>, EnumerationError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(EnumerationError::Unavailable("media index offline".into()));
        }
        Ok(Box::new(self.records.iter().enumerate().map(move |(i, r)| {
            if i == 0 {
                if let Some(hold) = &self.hold {
                    let _ = hold.reached.lock().unwrap().send(());
                    let _ = hold.release.lock().unwrap().recv();
                }
            }
            if !self.per_record_delay.is_zero() {
                thread::sleep(self.per_record_delay);
            }
            if self.fail_at == Some(i) {
                return Err(EnumerationError::Source("cursor closed".into()));
            }
            Ok(r.clone())
        })))
    }

    fn extended_metadata(&self, record: &RawRecord) -> Result<ExtendedMetadata, MetadataError> {
        if self.metadata_fails {
            return Err(MetadataError::Missing(record.path.clone()));
        }
        Ok(ExtendedMetadata {
            genre: Some("rock".into()),
        })
    }
}

struct Harness {
    source: Arc<FakeSource>,
    store: Arc<CatalogStore>,
    settings: Arc<SettingsStore>,
    events: Receiver<CatalogEvent>,
    sync: CatalogSynchronizer,
}

impl Harness {
    fn new(source: FakeSource, pattern: Option<&str>) -> Self {
        Self::with_interval(source, pattern, Duration::from_millis(200))
    }

    fn with_interval(source: FakeSource, pattern: Option<&str>, interval: Duration) -> Self {
        let source = Arc::new(source);
        let store = Arc::new(CatalogStore::new());
        let settings = Arc::new(SettingsStore::new());
        settings.set_songs_filter_pattern(pattern.map(str::to_string));
        let bus = Arc::new(EventBus::<CatalogEvent>::new());
        let events = bus.subscribe();
        let sync = CatalogSynchronizer::new(
            store.clone(),
            source.clone(),
            settings.clone(),
            bus,
            interval,
        );
        Self {
            source,
            store,
            settings,
            events,
            sync,
        }
    }

    fn ids(&self) -> Vec<u64> {
        self.store.list_all().iter().map(|s| s.id).collect()
    }

    fn drain(&self) -> Vec<CatalogEvent> {
        self.events.try_iter().collect()
    }
}

fn terminal(events: &[CatalogEvent]) -> Vec<&CatalogEvent> {
    events.iter().filter(|e| e.is_terminal()).collect()
}

#[test]
fn filter_keeps_only_matching_paths() {
    let source = FakeSource::with(vec![record(1, "live-a.mp3"), record(2, "studio-b.mp3")]);
    let h = Harness::new(source, Some("^live-"));

    let summary = h.sync.refresh_blocking().unwrap();
    assert_eq!(h.ids(), vec![1]);
    assert_eq!((summary.scanned, summary.admitted), (2, 1));

    let events = h.drain();
    assert!(matches!(events.last(), Some(CatalogEvent::Completed(s)) if s.admitted == 1));
    assert_eq!(terminal(&events).len(), 1);
}

#[test]
fn filter_is_case_insensitive() {
    let source = FakeSource::with(vec![record(1, "/Music/LIVE/a.mp3"), record(2, "/Music/b.mp3")]);
    let h = Harness::new(source, Some("/live/"));
    h.sync.refresh_blocking().unwrap();
    assert_eq!(h.ids(), vec![1]);
}

#[test]
fn filter_matching_nothing_publishes_empty_catalog() {
    let source = FakeSource::with(vec![record(1, "a.mp3"), record(2, "b.mp3")]);
    let h = Harness::new(source, None);
    h.sync.refresh_blocking().unwrap();
    assert_eq!(h.ids(), vec![1, 2]);

    h.settings.set_songs_filter_pattern(Some("^nothing-matches$".into()));
    h.sync.wait_idle();
    assert!(h.store.list_all().is_empty());
    assert_eq!(terminal(&h.drain()).len(), 2);
}

#[test]
fn malformed_pattern_admits_everything() {
    let source = FakeSource::with(vec![record(1, "a.mp3"), record(2, "b.mp3")]);
    let h = Harness::new(source, Some("([unclosed"));
    h.sync.refresh_blocking().unwrap();
    assert_eq!(h.ids(), vec![1, 2]);
}

#[test]
fn ingestion_order_follows_the_source() {
    let source = FakeSource::with(vec![record(30, "c.mp3"), record(10, "a.mp3"), record(20, "b.mp3")]);
    let h = Harness::new(source, None);
    h.sync.refresh_blocking().unwrap();
    assert_eq!(h.ids(), vec![30, 10, 20]);
}

#[test]
fn metadata_failure_still_admits_the_song() {
    let source = FakeSource {
        metadata_fails: true,
        ..FakeSource::with(vec![record(1, "a.mp3")])
    };
    let h = Harness::new(source, None);
    h.sync.refresh_blocking().unwrap();

    let song = h.store.get_by_id(1).unwrap();
    assert_eq!(song.genre, None);
    assert_eq!(song.title, "song 1");
}

#[test]
fn resolved_metadata_is_attached() {
    let h = Harness::new(FakeSource::with(vec![record(1, "a.mp3")]), None);
    h.sync.refresh_blocking().unwrap();
    assert_eq!(h.store.get_by_id(1).unwrap().genre.as_deref(), Some("rock"));
}

#[test]
fn open_failure_keeps_previous_snapshot() {
    let h = Harness::new(FakeSource::with(vec![record(1, "a.mp3")]), None);
    h.sync.refresh_blocking().unwrap();
    h.drain();

    h.source.fail_open.store(true, Ordering::SeqCst);
    let err = h.sync.refresh_blocking().unwrap_err();
    assert!(matches!(*err, RefreshError::Enumeration(EnumerationError::Unavailable(_))));
    assert_eq!(h.ids(), vec![1]);

    let events = h.drain();
    assert_eq!(terminal(&events).len(), 1);
    assert!(matches!(events.last(), Some(CatalogEvent::Failed(_))));
}

#[test]
fn mid_stream_failure_publishes_nothing() {
    let source = FakeSource {
        fail_at: Some(2),
        ..FakeSource::with(vec![record(1, "a.mp3"), record(2, "b.mp3"), record(3, "c.mp3")])
    };
    let h = Harness::new(source, None);
    h.store.replace_all(vec![Song {
        id: 99,
        ..Song::default()
    }]);

    assert!(h.sync.refresh_blocking().is_err());
    assert_eq!(h.ids(), vec![99]);
    let events = h.drain();
    assert!(matches!(terminal(&events)[..], [CatalogEvent::Failed(_)]));
}

#[test]
fn second_trigger_during_cycle_is_coalesced() {
    let (source, reached, release) = FakeSource::held(vec![record(1, "a.mp3")]);
    let h = Harness::new(source, None);

    assert_eq!(h.sync.state(), SyncState::Idle);
    assert_eq!(h.sync.refresh(), RefreshStatus::Started);
    reached.recv_timeout(Duration::from_secs(5)).unwrap();

    assert_eq!(h.sync.state(), SyncState::Refreshing);
    assert_eq!(h.sync.refresh(), RefreshStatus::Coalesced);
    assert!(matches!(
        *h.sync.refresh_blocking().unwrap_err(),
        RefreshError::AlreadyRunning
    ));

    release.send(()).unwrap();
    h.sync.wait_idle();

    assert_eq!(h.sync.state(), SyncState::Idle);
    assert_eq!(h.source.opened(), 1);
    let events = h.drain();
    assert_eq!(terminal(&events).len(), 1);
    assert!(matches!(terminal(&events)[0], CatalogEvent::Completed(_)));
}

#[test]
fn cancel_keeps_previous_snapshot() {
    let (source, reached, release) = FakeSource::held(vec![record(1, "a.mp3"), record(2, "b.mp3")]);
    let h = Harness::new(source, None);
    h.store.replace_all(vec![Song {
        id: 7,
        ..Song::default()
    }]);

    h.sync.refresh();
    reached.recv_timeout(Duration::from_secs(5)).unwrap();
    h.sync.cancel();
    release.send(()).unwrap();
    h.sync.wait_idle();

    assert_eq!(h.ids(), vec![7]);
    let events = h.drain();
    assert!(matches!(
        terminal(&events)[..],
        [CatalogEvent::Failed(cause)] if matches!(**cause, RefreshError::Cancelled)
    ));
}

#[test]
fn progress_is_rate_limited_and_precedes_the_outcome() {
    let records = (1..=40).map(|i| record(i, &format!("{i}.mp3"))).collect();
    let source = FakeSource {
        per_record_delay: Duration::from_millis(5),
        ..FakeSource::with(records)
    };
    let interval = Duration::from_millis(40);
    let h = Harness::with_interval(source, None, interval);

    let summary = h.sync.refresh_blocking().unwrap();
    let events = h.drain();

    let progress: Vec<RefreshProgress> = events
        .iter()
        .filter_map(|e| match e {
            CatalogEvent::Progress(p) => Some(*p),
            _ => None,
        })
        .collect();
    let bound = (summary.elapsed.as_millis() / interval.as_millis()) as usize;
    assert!(!progress.is_empty());
    assert!(progress.len() <= bound, "{} ticks in {:?}", progress.len(), summary.elapsed);
    assert!(progress.windows(2).all(|w| w[0].scanned <= w[1].scanned));

    assert!(events.last().is_some_and(CatalogEvent::is_terminal));
    assert_eq!(terminal(&events).len(), 1);
}

#[test]
fn completed_fires_after_the_snapshot_is_visible() {
    struct Witness {
        store: Arc<CatalogStore>,
        seen: Mutex<Option<usize>>,
    }

    impl NotificationSink for Witness {
        fn progress(&self, _progress: RefreshProgress) {}

        fn completed(&self, _summary: RefreshSummary) {
            *self.seen.lock().unwrap() = Some(self.store.list_all().len());
        }

        fn failed(&self, _cause: Arc<RefreshError>) {}
    }

    let store = Arc::new(CatalogStore::new());
    let witness = Arc::new(Witness {
        store: store.clone(),
        seen: Mutex::new(None),
    });
    let sync = CatalogSynchronizer::new(
        store,
        Arc::new(FakeSource::with(vec![record(1, "a.mp3"), record(2, "b.mp3")])),
        Arc::new(SettingsStore::new()),
        witness.clone(),
        Duration::from_millis(200),
    );

    sync.refresh_blocking().unwrap();
    assert_eq!(*witness.seen.lock().unwrap(), Some(2));
}

#[test]
fn filter_change_triggers_refresh_other_keys_do_not() {
    let source = FakeSource::with(vec![record(1, "live-a.mp3"), record(2, "b.mp3")]);
    let h = Harness::new(source, None);
    h.sync.refresh_blocking().unwrap();
    assert_eq!(h.source.opened(), 1);

    h.settings.set_value("theme", "dark");
    h.sync.wait_idle();
    assert_eq!(h.source.opened(), 1);

    h.settings.set_songs_filter_pattern(Some("^live-".into()));
    h.sync.wait_idle();
    assert_eq!(h.source.opened(), 2);
    assert_eq!(h.ids(), vec![1]);
}

#[test]
fn completed_handler_can_trigger_the_next_cycle() {
    struct Retune {
        settings: Arc<SettingsStore>,
        retuned: AtomicBool,
        admitted: Mutex<Sender<usize>>,
    }

    impl NotificationSink for Retune {
        fn progress(&self, _progress: RefreshProgress) {}

        fn completed(&self, summary: RefreshSummary) {
            let _ = self.admitted.lock().unwrap().send(summary.admitted);
            if !self.retuned.swap(true, Ordering::SeqCst) {
                self.settings.set_songs_filter_pattern(Some("^live-".into()));
            }
        }

        fn failed(&self, _cause: Arc<RefreshError>) {}
    }

    let source = Arc::new(FakeSource::with(vec![record(1, "live-a.mp3"), record(2, "b.mp3")]));
    let store = Arc::new(CatalogStore::new());
    let settings = Arc::new(SettingsStore::new());
    let (admitted_tx, admitted) = mpsc::channel();
    let sink = Arc::new(Retune {
        settings: settings.clone(),
        retuned: AtomicBool::new(false),
        admitted: Mutex::new(admitted_tx),
    });
    let sync = CatalogSynchronizer::new(
        store.clone(),
        source.clone(),
        settings,
        sink,
        Duration::from_millis(200),
    );

    assert_eq!(sync.refresh_blocking().unwrap().admitted, 2);
    assert_eq!(admitted.recv_timeout(Duration::from_secs(5)).unwrap(), 2);
    assert_eq!(admitted.recv_timeout(Duration::from_secs(5)).unwrap(), 1);
    sync.wait_idle();

    assert_eq!(source.opened(), 2);
    assert_eq!(store.list_all().len(), 1);
    assert_eq!(sync.state(), SyncState::Idle);
}

#[test]
fn cancel_while_idle_does_not_reach_the_next_cycle() {
    let h = Harness::new(FakeSource::with(vec![record(1, "a.mp3")]), None);
    h.sync.refresh_blocking().unwrap();

    h.sync.cancel();
    assert_eq!(h.sync.refresh_blocking().unwrap().admitted, 1);

    assert_eq!(h.sync.refresh(), RefreshStatus::Started);
    h.sync.wait_idle();
    let events = h.drain();
    assert_eq!(terminal(&events).len(), 3);
    assert!(terminal(&events).iter().all(|e| matches!(e, CatalogEvent::Completed(_))));
}

#[test]
fn dropping_the_synchronizer_ends_the_subscription() {
    let source = Arc::new(FakeSource::with(vec![record(1, "a.mp3")]));
    let settings = Arc::new(SettingsStore::new());
    let sync = CatalogSynchronizer::new(
        Arc::new(CatalogStore::new()),
        source.clone(),
        settings.clone(),
        Arc::new(EventBus::<CatalogEvent>::new()),
        Duration::from_millis(200),
    );
    assert_eq!(settings.listener_count(), 1);

    drop(sync);
    assert_eq!(settings.listener_count(), 0);
    settings.set_songs_filter_pattern(Some("x".into()));
    assert_eq!(source.opened(), 0);
}

#[test]
fn event_bus_prunes_dropped_subscribers() {
    let bus = EventBus::<u32>::new();
    let kept = bus.subscribe();
    let dropped = bus.subscribe();
    drop(dropped);

    bus.dispatch(5);
    assert_eq!(bus.subscriber_count(), 1);
    assert_eq!(kept.try_recv().unwrap(), 5);
}
