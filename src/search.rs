//! Fuzzy matching and weighted multi-field ranking.

mod fuzzy;
mod index;

pub use fuzzy::{EMPTY_QUERY_SCORE, is_exact, score};
pub use index::{FieldExtractor, Scored, SearchField, WeightedSearchIndex};
