use serde::Deserialize;

use crate::library::SortKey;

/// Top-level settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/groove/config.toml` or `~/.config/groove/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `GROOVE__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub library: LibrarySettings,
    pub search: SearchSettings,
    pub sync: SyncSettings,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackDisplayField {
    /// "artist - title", or just the title when no artist is known.
    Display,
    Title,
    Artist,
    Album,
    Filename,
    Path,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional cap on directory recursion depth.
    pub max_depth: Option<usize>,

    /// Which fields to use when printing a song.
    ///
    /// Example: ["artist", "title"] -> "Artist - Title"
    pub display_fields: Vec<TrackDisplayField>,
    /// Separator used to join `display_fields`.
    pub display_separator: String,

    /// Ordering used when listing the whole catalog.
    pub default_sort: SortKey,
    pub default_sort_reversed: bool,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            extensions: vec!["mp3".into(), "flac".into(), "wav".into(), "ogg".into()],
            follow_links: true,
            include_hidden: true,
            recursive: true,
            max_depth: None,
            display_fields: vec![TrackDisplayField::Artist, TrackDisplayField::Title],
            display_separator: " - ".to_string(),
            default_sort: SortKey::Title,
            default_sort_reversed: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Maximum number of hits returned by a search.
    pub max_results: usize,
    /// Per-field multipliers applied to the fuzzy score. Must be >= 1.
    pub title_weight: u32,
    pub filename_weight: u32,
    pub artist_weight: u32,
    pub album_weight: u32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_results: 7,
            title_weight: 3,
            filename_weight: 2,
            artist_weight: 1,
            album_weight: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Case-insensitive regex; only songs whose path matches are kept.
    pub songs_filter_pattern: Option<String>,
    /// Minimum spacing between progress notifications (milliseconds).
    pub progress_interval_ms: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            songs_filter_pattern: None,
            progress_interval_ms: 200,
        }
    }
}
