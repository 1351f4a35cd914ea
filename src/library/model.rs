use std::time::Duration;

use crate::sync::{ExtendedMetadata, RawRecord};

/// Stable identifier of a song within the catalog.
pub type SongId = u64;

/// A single catalog entry.
///
/// Built once per source record during a refresh and never changed afterwards;
/// a newer snapshot replaces songs wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Song {
    pub id: SongId,
    pub title: String,
    pub filename: String,
    pub path: String,
    pub artist_name: Option<String>,
    pub album_id: u64,
    pub album_name: Option<String>,
    pub album_artist: Option<String>,
    pub composer: Option<String>,
    pub year: Option<u32>,
    pub duration: Duration,
    /// Unix seconds.
    pub date_added: i64,
    /// Unix seconds.
    pub date_modified: i64,
    pub genre: Option<String>,
}

impl Song {
    /// Build a song from a raw record plus whatever extended metadata could be resolved.
    pub fn from_record(record: RawRecord, extended: ExtendedMetadata) -> Self {
        Self {
            id: record.id,
            title: record.title,
            filename: record.filename,
            path: record.path,
            artist_name: record.artist_name,
            album_id: record.album_id,
            album_name: record.album_name,
            album_artist: record.album_artist,
            composer: record.composer,
            year: record.year,
            duration: record.duration,
            date_added: record.date_added,
            date_modified: record.date_modified,
            genre: extended.genre,
        }
    }
}
