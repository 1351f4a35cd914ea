//! Error types shared across the catalog, search and sync layers.

use std::path::PathBuf;

use thiserror::Error;

use crate::library::SongId;

/// Settings could not be loaded, or loaded values are unusable.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Failures raised by a record source while it is being enumerated.
#[derive(Debug, Error)]
pub enum EnumerationError {
    #[error("record source unavailable: {0}")]
    Unavailable(String),

    #[error("I/O error while enumerating {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("record source failed: {0}")]
    Source(String),
}

/// A best-effort per-record metadata lookup failed.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("could not read tags from {path}: {reason}")]
    Unreadable { path: String, reason: String },

    #[error("no extended metadata available for {0}")]
    Missing(String),
}

#[derive(Debug, Error)]
pub enum FilterPatternError {
    #[error("invalid songs filter pattern {pattern:?}: {source}")]
    Invalid {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Why a refresh cycle ended without publishing a new snapshot.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("enumeration failed: {0}")]
    Enumeration(#[from] EnumerationError),

    #[error("refresh cancelled before completion")]
    Cancelled,

    #[error("a refresh is already in progress")]
    AlreadyRunning,

    #[error("could not start refresh worker: {0}")]
    Worker(String),
}

/// Query-time failures reported to callers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("unknown sort key {0:?}")]
    InvalidSortKey(String),

    #[error("no song with id {0}")]
    NotFound(SongId),
}
