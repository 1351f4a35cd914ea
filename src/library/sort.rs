use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::QueryError;

use super::model::Song;

/// Field used to order a song listing.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    Title,
    #[serde(alias = "artist-name")]
    Artist,
    #[serde(alias = "album-name")]
    Album,
    Duration,
    DateAdded,
    DateModified,
    Composer,
    AlbumArtist,
    Year,
    Filename,
}

impl SortKey {
    pub const ALL: [SortKey; 10] = [
        SortKey::Title,
        SortKey::Artist,
        SortKey::Album,
        SortKey::Duration,
        SortKey::DateAdded,
        SortKey::DateModified,
        SortKey::Composer,
        SortKey::AlbumArtist,
        SortKey::Year,
        SortKey::Filename,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Title => "title",
            SortKey::Artist => "artist",
            SortKey::Album => "album",
            SortKey::Duration => "duration",
            SortKey::DateAdded => "date-added",
            SortKey::DateModified => "date-modified",
            SortKey::Composer => "composer",
            SortKey::AlbumArtist => "album-artist",
            SortKey::Year => "year",
            SortKey::Filename => "filename",
        }
    }

    /// Natural ordering of the selected field. Missing values sort first.
    pub fn compare(self, a: &Song, b: &Song) -> Ordering {
        match self {
            SortKey::Title => a.title.cmp(&b.title),
            SortKey::Artist => a.artist_name.cmp(&b.artist_name),
            SortKey::Album => a.album_name.cmp(&b.album_name),
            SortKey::Duration => a.duration.cmp(&b.duration),
            SortKey::DateAdded => a.date_added.cmp(&b.date_added),
            SortKey::DateModified => a.date_modified.cmp(&b.date_modified),
            SortKey::Composer => a.composer.cmp(&b.composer),
            SortKey::AlbumArtist => a.album_artist.cmp(&b.album_artist),
            SortKey::Year => a.year.cmp(&b.year),
            SortKey::Filename => a.filename.cmp(&b.filename),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = QueryError;

    /// Accepts kebab-case, snake_case and upper-case spellings (`date-added`, `DATE_ADDED`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        let key = match normalized.as_str() {
            "artist-name" => SortKey::Artist,
            "album-name" => SortKey::Album,
            other => SortKey::ALL
                .into_iter()
                .find(|k| k.as_str() == other)
                .ok_or_else(|| QueryError::InvalidSortKey(s.to_string()))?,
        };
        Ok(key)
    }
}

/// Stable sort of `songs` by `key`.
///
/// With `reversed` the fully sorted result is reversed afterwards, so songs
/// with equal keys come out in the opposite of their input order.
pub fn sort(songs: &[Song], key: SortKey, reversed: bool) -> Vec<Song> {
    let mut sorted = songs.to_vec();
    sorted.sort_by(|a, b| key.compare(a, b));
    if reversed {
        sorted.reverse();
    }
    sorted
}
