use std::fmt;

use crate::config::SearchSettings;
use crate::library::Song;

use super::fuzzy;

/// Pulls one searchable value out of an item. `None` scores zero.
pub type FieldExtractor<T> = fn(&T) -> Option<&str>;

/// One searchable field and its weight.
pub struct SearchField<T> {
    name: &'static str,
    extract: FieldExtractor<T>,
    weight: u32,
    exact_first: bool,
}

impl<T> SearchField<T> {
    /// A field with the default weight of 1.
    pub fn new(name: &'static str, extract: FieldExtractor<T>) -> Self {
        Self {
            name,
            extract,
            weight: 1,
            exact_first: false,
        }
    }

    /// Override the weight. Zero is clamped to 1.
    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight.max(1);
        self
    }

    /// Items whose value equals the query outrank every item whose value does not.
    pub fn ranks_exact_first(mut self) -> Self {
        self.exact_first = true;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    pub fn is_exact_first(&self) -> bool {
        self.exact_first
    }

    fn matches_exactly(&self, query: &str, item: &T) -> bool {
        self.exact_first && (self.extract)(item).is_some_and(|value| fuzzy::is_exact(query, value))
    }

    fn score(&self, query: &str, item: &T) -> f64 {
        (self.extract)(item).map_or(0.0, |value| {
            f64::from(self.weight) * fuzzy::score(query, value)
        })
    }
}

impl<T> Clone for SearchField<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            extract: self.extract,
            weight: self.weight,
            exact_first: self.exact_first,
        }
    }
}

impl<T> fmt::Debug for SearchField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchField")
            .field("name", &self.name)
            .field("weight", &self.weight)
            .field("exact_first", &self.exact_first)
            .finish()
    }
}

/// An item paired with its weighted total score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scored<'a, T> {
    pub item: &'a T,
    pub score: f64,
    /// An exact-first field equals the query.
    pub exact: bool,
}

/// Ranks items by the weighted sum of per-field fuzzy scores.
#[derive(Debug, Clone)]
pub struct WeightedSearchIndex<T> {
    fields: Vec<SearchField<T>>,
}

impl<T> WeightedSearchIndex<T> {
    pub fn new(fields: Vec<SearchField<T>>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[SearchField<T>] {
        &self.fields
    }

    /// Total weighted score of one item.
    pub fn score(&self, query: &str, item: &T) -> f64 {
        self.fields.iter().map(|f| f.score(query, item)).sum()
    }

    /// Every item with a non-zero score, best first.
    ///
    /// Exact matches on an exact-first field come before all other items,
    /// then higher totals first. Equal ranks keep their input order.
    pub fn rank<'a>(&self, query: &str, items: &'a [T]) -> Vec<Scored<'a, T>> {
        let mut scored: Vec<Scored<'a, T>> = items
            .iter()
            .map(|item| Scored {
                item,
                score: self.score(query, item),
                exact: self.fields.iter().any(|f| f.matches_exactly(query, item)),
            })
            .filter(|s| s.score > 0.0)
            .collect();
        // `sort_by` is stable.
        scored.sort_by(|a, b| b.exact.cmp(&a.exact).then(b.score.total_cmp(&a.score)));
        scored
    }

    /// Up to `limit` best matches; fewer when fewer items score above zero.
    pub fn search<'a>(&self, query: &str, items: &'a [T], limit: usize) -> Vec<&'a T> {
        self.rank(query, items)
            .into_iter()
            .take(limit)
            .map(|s| s.item)
            .collect()
    }
}

fn song_title(song: &Song) -> Option<&str> {
    Some(song.title.as_str())
}

fn song_filename(song: &Song) -> Option<&str> {
    Some(song.filename.as_str())
}

fn song_artist(song: &Song) -> Option<&str> {
    song.artist_name.as_deref()
}

fn song_album(song: &Song) -> Option<&str> {
    song.album_name.as_deref()
}

impl WeightedSearchIndex<Song> {
    /// Title, filename, artist and album, weighted per `settings`.
    pub fn for_songs(settings: &SearchSettings) -> Self {
        Self::new(vec![
            SearchField::new("title", song_title)
                .with_weight(settings.title_weight)
                .ranks_exact_first(),
            SearchField::new("filename", song_filename).with_weight(settings.filename_weight),
            SearchField::new("artist", song_artist).with_weight(settings.artist_weight),
            SearchField::new("album", song_album).with_weight(settings.album_weight),
        ])
    }
}

impl Default for WeightedSearchIndex<Song> {
    fn default() -> Self {
        Self::for_songs(&SearchSettings::default())
    }
}
