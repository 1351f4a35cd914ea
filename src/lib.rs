//! In-memory song catalog: background refresh from a record source, fuzzy
//! weighted search and stable multi-key sorting over immutable snapshots.

pub mod catalog;
pub mod config;
pub mod error;
pub mod library;
pub mod search;
pub mod settings;
pub mod sync;
