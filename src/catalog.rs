//! The song catalog facade consumed by application code.

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use crate::config::Settings;
use crate::error::{QueryError, RefreshError};
use crate::library::{self, CatalogSnapshot, CatalogStore, Song, SongId, SortKey};
use crate::search::WeightedSearchIndex;
use crate::sync::{
    CatalogEvent, CatalogSynchronizer, EventBus, FilterPatternProvider, RecordEnumerator,
    RefreshStatus, RefreshSummary,
};

/// Owns the store, the synchronizer that fills it and the search index over it.
///
/// Every query reads one snapshot, so a result never mixes songs from two
/// refresh cycles.
pub struct SongCatalog {
    store: Arc<CatalogStore>,
    events: Arc<EventBus<CatalogEvent>>,
    synchronizer: CatalogSynchronizer,
    index: WeightedSearchIndex<Song>,
    max_results: usize,
}

impl SongCatalog {
    pub fn new(
        enumerator: Arc<dyn RecordEnumerator>,
        filter: Arc<dyn FilterPatternProvider>,
        settings: &Settings,
    ) -> Self {
        let store = Arc::new(CatalogStore::new());
        let events = Arc::new(EventBus::<CatalogEvent>::new());
        let synchronizer = CatalogSynchronizer::new(
            Arc::clone(&store),
            enumerator,
            filter,
            events.clone(),
            Duration::from_millis(settings.sync.progress_interval_ms),
        );

        Self {
            store,
            events,
            synchronizer,
            index: WeightedSearchIndex::for_songs(&settings.search),
            max_results: settings.search.max_results,
        }
    }

    /// Start a background refresh. See [`CatalogSynchronizer::refresh`].
    pub fn fetch(&self) -> RefreshStatus {
        self.synchronizer.refresh()
    }

    pub fn fetch_blocking(&self) -> Result<RefreshSummary, Arc<RefreshError>> {
        self.synchronizer.refresh_blocking()
    }

    /// Receive progress and outcome events of every later refresh.
    pub fn subscribe(&self) -> Receiver<CatalogEvent> {
        self.events.subscribe()
    }

    pub fn synchronizer(&self) -> &CatalogSynchronizer {
        &self.synchronizer
    }

    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.store.snapshot()
    }

    pub fn get_all(&self) -> Vec<Song> {
        self.store.list_all()
    }

    pub fn get_by_id(&self, id: SongId) -> Option<Song> {
        self.store.get_by_id(id)
    }

    pub fn require(&self, id: SongId) -> Result<Song, QueryError> {
        self.get_by_id(id).ok_or(QueryError::NotFound(id))
    }

    pub fn has_id(&self, id: SongId) -> bool {
        self.store.has_id(id)
    }

    pub fn get_by_artist(&self, artist_name: &str) -> Vec<Song> {
        self.store.list_by_artist(artist_name)
    }

    pub fn get_by_album(&self, album_id: u64) -> Vec<Song> {
        self.store.list_by_album(album_id)
    }

    /// Best matches for `query`, at most `search.max_results` of them.
    pub fn search(&self, query: &str) -> Vec<Song> {
        let snapshot = self.store.snapshot();
        self.index
            .search(query, snapshot.songs(), self.max_results)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn sort(songs: &[Song], key: SortKey, reversed: bool) -> Vec<Song> {
        library::sort(songs, key, reversed)
    }

    /// Like [`SongCatalog::sort`], with the key given by name (`"date-added"`, `"year"`, ...).
    pub fn sort_by_name(
        songs: &[Song],
        key: &str,
        reversed: bool,
    ) -> Result<Vec<Song>, QueryError> {
        let key: SortKey = key.parse()?;
        Ok(library::sort(songs, key, reversed))
    }
}
