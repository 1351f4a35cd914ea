//! Settings schema and loader.
//!
//! Settings drive the directory scanner, the search weights and the refresh
//! cadence. Loading is layered: defaults, then an optional TOML file, then
//! `GROOVE__*` environment variables.

mod load;
mod schema;

pub use load::{default_config_path, resolve_config_path};
pub use schema::*;
