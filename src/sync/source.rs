//! Interfaces of the external collaborators a refresh cycle consumes.

use std::time::Duration;

use crate::error::{EnumerationError, MetadataError};
use crate::library::SongId;

/// One record as yielded by a [`RecordEnumerator`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
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
    pub date_added: i64,
    pub date_modified: i64,
}

/// Metadata resolved per record on a best-effort basis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtendedMetadata {
    pub genre: Option<String>,
}

/// Lazy, finite stream of records. An `Err` item aborts the cycle.
pub type RecordStream<'a> = Box<dyn Iterator<Item = Result<RawRecord, EnumerationError>> + 'a>;

/// The source a refresh cycle enumerates (a media index, a directory tree, ...).
pub trait RecordEnumerator: Send + Sync {
    /// Open the source. Failing here aborts the cycle before any record is read.
    fn records(&self) -> Result<RecordStream<'_>, EnumerationError>;

    /// Resolve extra metadata for one record. Failures never exclude the record.
    fn extended_metadata(&self, _record: &RawRecord) -> Result<ExtendedMetadata, MetadataError> {
        Ok(ExtendedMetadata::default())
    }
}

/// Identifies which setting changed in a change notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SettingKey {
    SongsFilterPattern,
    Named(String),
}

pub type ListenerId = u64;

/// Callback invoked with the key of every changed setting.
pub type SettingsListener = Box<dyn Fn(&SettingKey) + Send + Sync>;

/// Supplies the current songs filter pattern and announces setting changes.
pub trait FilterPatternProvider: Send + Sync {
    fn songs_filter_pattern(&self) -> Option<String>;

    fn add_listener(&self, listener: SettingsListener) -> ListenerId;

    fn remove_listener(&self, id: ListenerId);
}
