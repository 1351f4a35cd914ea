//! The keyed song cache.
//!
//! Readers load an `Arc` to the current [`CatalogSnapshot`] from an
//! [`ArcSwap`] and work on it without taking any lock. The only mutation, [`CatalogStore::replace_all`],
//! builds a complete snapshot first and then swaps the reference in one step,
//! so a reader sees either the previous catalog or the new one.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::debug;

use super::model::{Song, SongId};

/// An immutable, fully populated view of the catalog.
#[derive(Debug, Default)]
pub struct CatalogSnapshot {
    songs: Vec<Song>,
    by_id: HashMap<SongId, usize>,
}

impl CatalogSnapshot {
    /// Build a snapshot keyed by id.
    ///
    /// Duplicate ids keep the slot of their first occurrence and the value of
    /// the last one.
    pub fn from_songs<I>(songs: I) -> Self
    where
        I: IntoIterator<Item = Song>,
    {
        let mut ordered: Vec<Song> = Vec::new();
        let mut by_id: HashMap<SongId, usize> = HashMap::new();

        for song in songs {
            match by_id.get(&song.id) {
                Some(&slot) => ordered[slot] = song,
                None => {
                    by_id.insert(song.id, ordered.len());
                    ordered.push(song);
                }
            }
        }

        Self {
            songs: ordered,
            by_id,
        }
    }

    /// Songs in ingestion order.
    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    pub fn get(&self, id: SongId) -> Option<&Song> {
        self.by_id.get(&id).map(|&slot| &self.songs[slot])
    }

    pub fn contains(&self, id: SongId) -> bool {
        self.by_id.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    pub fn by_artist<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Song> + 'a {
        self.songs
            .iter()
            .filter(move |s| s.artist_name.as_deref() == Some(name))
    }

    pub fn by_album(&self, album_id: u64) -> impl Iterator<Item = &Song> + '_ {
        self.songs.iter().filter(move |s| s.album_id == album_id)
    }
}

/// Holder of the current snapshot.
#[derive(Debug)]
pub struct CatalogStore {
    current: ArcSwap<CatalogSnapshot>,
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogStore {
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(CatalogSnapshot::default()),
        }
    }

    /// The snapshot that is current right now.
    ///
    /// The returned handle stays valid (and unchanged) even if a newer snapshot
    /// is published afterwards.
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.current.load_full()
    }

    /// Discard the current snapshot and install one built from `songs`.
    pub fn replace_all<I>(&self, songs: I)
    where
        I: IntoIterator<Item = Song>,
    {
        let next = Arc::new(CatalogSnapshot::from_songs(songs));
        let count = next.len();
        let previous = self.current.swap(next);
        debug!(songs = count, previous = previous.len(), "catalog snapshot replaced");
    }

    pub fn get_by_id(&self, id: SongId) -> Option<Song> {
        self.snapshot().get(id).cloned()
    }

    pub fn has_id(&self, id: SongId) -> bool {
        self.snapshot().contains(id)
    }

    pub fn list_all(&self) -> Vec<Song> {
        self.snapshot().songs().to_vec()
    }

    pub fn list_by_artist(&self, name: &str) -> Vec<Song> {
        self.snapshot().by_artist(name).cloned().collect()
    }

    pub fn list_by_album(&self, album_id: u64) -> Vec<Song> {
        self.snapshot().by_album(album_id).cloned().collect()
    }
}
