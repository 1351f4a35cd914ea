use regex::{Regex, RegexBuilder};
use tracing::warn;

use crate::error::FilterPatternError;

/// Case-insensitive path filter applied while a snapshot is built.
///
/// A song is admitted when the pattern matches anywhere in its path.
#[derive(Debug, Clone)]
pub struct FilterPattern {
    regex: Regex,
}

impl FilterPattern {
    pub fn new(pattern: &str) -> Result<Self, FilterPatternError> {
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map(|regex| Self { regex })
            .map_err(|source| FilterPatternError::Invalid {
                pattern: pattern.to_string(),
                source,
            })
    }

    /// Turn a configured pattern into a filter.
    ///
    /// Blank means "no filter". A malformed pattern is logged and also treated
    /// as "no filter", so a bad setting never empties the catalog.
    pub fn resolve(pattern: Option<&str>) -> Option<Self> {
        let pattern = pattern.filter(|p| !p.trim().is_empty())?;
        match Self::new(pattern) {
            Ok(filter) => Some(filter),
            Err(err) => {
                warn!(error = %err, "ignoring songs filter pattern, admitting all songs");
                None
            }
        }
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}
