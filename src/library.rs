//! Song model, the snapshot store and listing helpers.
//!
//! `store` holds the current catalog snapshot, `sort` orders listings and
//! `scan` provides a directory-backed record source.

mod display;
mod model;
mod scan;
mod sort;
mod store;

pub use model::{Song, SongId};
pub use scan::DirectoryEnumerator;
pub use sort::{SortKey, sort};
pub use store::{CatalogSnapshot, CatalogStore};
