use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use lofty::prelude::*;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::LibrarySettings;
use crate::error::{EnumerationError, MetadataError};
use crate::sync::{ExtendedMetadata, RawRecord, RecordEnumerator, RecordStream};

/// Enumerates audio files below a directory, reading tags with `lofty`.
pub struct DirectoryEnumerator {
    root: PathBuf,
    settings: LibrarySettings,
}

impl DirectoryEnumerator {
    pub fn new(root: impl Into<PathBuf>, settings: LibrarySettings) -> Self {
        Self {
            root: root.into(),
            settings,
        }
    }
}

impl RecordEnumerator for DirectoryEnumerator {
    fn records(&self) -> Result<RecordStream<'_>, EnumerationError> {
        if !self.root.is_dir() {
            return Err(EnumerationError::Unavailable(format!(
                "{} is not a directory",
                self.root.display()
            )));
        }

        let exts = normalized_extensions(&self.settings);
        let include_hidden = self.settings.include_hidden;

        let mut walker = WalkDir::new(&self.root)
            .follow_links(self.settings.follow_links)
            .sort_by_file_name();

        // Non-recursive = only the root directory.
        let depth_cap = if self.settings.recursive {
            self.settings.max_depth
        } else {
            Some(1)
        };
        if let Some(d) = depth_cap {
            walker = walker.max_depth(d);
        }

        let root = self.root.clone();
        let records = walker
            .into_iter()
            .filter_entry(move |e| include_hidden || e.depth() == 0 || !is_hidden(e.path()))
            .filter_map(move |entry| match entry {
                Ok(entry) => Some(Ok(entry)),
                // The root itself could not be read: the whole source is unreachable.
                Err(err) if err.depth() == 0 => Some(Err(root_error(&root, err))),
                Err(err) => {
                    warn!(error = %err, "skipping unreadable library entry");
                    None
                }
            })
            .filter(move |entry| match entry {
                Ok(entry) => entry.path().is_file() && is_audio_file(entry.path(), &exts),
                Err(_) => true,
            })
            .map(|entry| entry.map(|entry| read_record(entry.path())));

        Ok(Box::new(records))
    }

    fn extended_metadata(&self, record: &RawRecord) -> Result<ExtendedMetadata, MetadataError> {
        let tagged = lofty::read_from_path(&record.path).map_err(|e| MetadataError::Unreadable {
            path: record.path.clone(),
            reason: e.to_string(),
        })?;
        let tag = tagged
            .primary_tag()
            .or_else(|| tagged.first_tag())
            .ok_or_else(|| MetadataError::Missing(record.path.clone()))?;

        Ok(ExtendedMetadata {
            genre: tag_string(tag, &ItemKey::Genre),
        })
    }
}

fn root_error(root: &Path, err: walkdir::Error) -> EnumerationError {
    let path = err.path().unwrap_or(root).to_path_buf();
    let source = err
        .into_io_error()
        .unwrap_or_else(|| io::Error::other("directory walk failed"));
    EnumerationError::Io { path, source }
}

fn normalized_extensions(settings: &LibrarySettings) -> Vec<String> {
    settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

fn is_audio_file(path: &Path, exts: &[String]) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

fn tag_string(tag: &lofty::tag::Tag, key: &ItemKey) -> Option<String> {
    tag.get_string(key)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Leading year digits of a date tag such as `1997-05-21` or `1997`.
fn parse_year(date: &str) -> Option<u32> {
    let digits: String = date
        .trim()
        .chars()
        .take_while(char::is_ascii_digit)
        .take(4)
        .collect();
    if digits.len() == 4 {
        digits.parse().ok()
    } else {
        None
    }
}

/// First eight bytes of the SHA-256 of `source`, stable across runs.
fn stable_id(source: &str) -> u64 {
    let digest = Sha256::digest(source.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

fn unix_seconds(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn file_times(path: &Path) -> (i64, i64) {
    match fs::metadata(path) {
        Ok(meta) => {
            let modified = meta.modified().map(unix_seconds).unwrap_or(0);
            let added = meta.created().map(unix_seconds).unwrap_or(modified);
            (added, modified)
        }
        Err(err) => {
            debug!(path = %path.display(), error = %err, "no filesystem times");
            (0, 0)
        }
    }
}

fn read_record(path: &Path) -> RawRecord {
    let path_str = path.to_string_lossy().into_owned();
    let filename = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut title = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("UNKNOWN")
        .to_string();
    let mut artist_name: Option<String> = None;
    let mut album_name: Option<String> = None;
    let mut album_artist: Option<String> = None;
    let mut composer: Option<String> = None;
    let mut year: Option<u32> = None;
    let mut duration = Duration::ZERO;

    match lofty::read_from_path(path) {
        Ok(tagged) => {
            duration = tagged.properties().duration();

            if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
                if let Some(v) = tag_string(tag, &ItemKey::TrackTitle) {
                    title = v;
                }
                artist_name = tag_string(tag, &ItemKey::TrackArtist);
                album_name = tag_string(tag, &ItemKey::AlbumTitle);
                album_artist = tag_string(tag, &ItemKey::AlbumArtist);
                composer = tag_string(tag, &ItemKey::Composer);
                year = tag_string(tag, &ItemKey::RecordingDate).and_then(|d| parse_year(&d));
            }
        }
        Err(err) => debug!(path = %path_str, error = %err, "no readable tags, using file name"),
    }

    // Untagged files are grouped by folder.
    let album_id = match &album_name {
        Some(name) => stable_id(&format!(
            "{}\u{0}{}",
            name.to_lowercase(),
            album_artist.as_deref().unwrap_or_default().to_lowercase()
        )),
        None => stable_id(
            &path
                .parent()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default(),
        ),
    };

    let (date_added, date_modified) = file_times(path);

    RawRecord {
        id: stable_id(&path_str),
        title,
        filename,
        path: path_str,
        artist_name,
        album_id,
        album_name,
        album_artist,
        composer,
        year,
        duration,
        date_added,
        date_modified,
    }
}
