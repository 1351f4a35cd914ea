//! Query/candidate similarity in `[0, 1]`.
//!
//! Scores are tiered so the ordering guarantees hold regardless of length:
//!
//! | case                                   | score        |
//! |----------------------------------------|--------------|
//! | equal (ignoring case)                  | `1.0`        |
//! | candidate contains the query           | `[0.6, 0.9)` |
//! | anything else                          | `[0.0, 0.5]` |
//! | blank query                            | `0.1`        |

/// Score given to every candidate when the query is blank.
pub const EMPTY_QUERY_SCORE: f64 = 0.1;

const CONTAINS_FLOOR: f64 = 0.6;
const CONTAINS_SPAN: f64 = 0.3;
const LOOSE_CEILING: f64 = 0.5;

/// Similarity between `query` and `candidate`, case-insensitive.
pub fn score(query: &str, candidate: &str) -> f64 {
    if query.trim().is_empty() {
        return EMPTY_QUERY_SCORE;
    }
    let query: Vec<char> = query.chars().flat_map(char::to_lowercase).collect();
    let candidate: Vec<char> = candidate.chars().flat_map(char::to_lowercase).collect();
    if candidate.is_empty() {
        return 0.0;
    }

    if query == candidate {
        return 1.0;
    }

    if contains(&candidate, &query) {
        let coverage = query.len() as f64 / candidate.len() as f64;
        return CONTAINS_FLOOR + CONTAINS_SPAN * coverage;
    }

    let edit = 1.0 - levenshtein(&query, &candidate) as f64 / query.len().max(candidate.len()) as f64;
    let ordered = subsequence_coverage(&query, &candidate);
    LOOSE_CEILING * edit.max(ordered)
}

/// Case-insensitive equality. A blank query equals nothing.
pub fn is_exact(query: &str, candidate: &str) -> bool {
    !query.trim().is_empty()
        && query
            .chars()
            .flat_map(char::to_lowercase)
            .eq(candidate.chars().flat_map(char::to_lowercase))
}

fn contains(haystack: &[char], needle: &[char]) -> bool {
    needle.len() <= haystack.len() && haystack.windows(needle.len()).any(|w| w == needle)
}

/// Fraction of query characters found in order in the candidate.
fn subsequence_coverage(query: &[char], candidate: &[char]) -> f64 {
    let mut rest = candidate.iter();
    let matched = query
        .iter()
        .filter(|qc| rest.any(|cc| cc == *qc))
        .count();
    matched as f64 / query.len() as f64
}

/// Single-character edit distance, two rows at a time.
fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev_row: Vec<usize> = (0..=b.len()).collect();
    let mut curr_row: Vec<usize> = vec![0; b.len() + 1];

    for (i, a_char) in a.iter().enumerate() {
        curr_row[0] = i + 1;

        for (j, b_char) in b.iter().enumerate() {
            let cost = usize::from(a_char != b_char);

            curr_row[j + 1] = (prev_row[j + 1] + 1) // deletion
                .min(curr_row[j] + 1) // insertion
                .min(prev_row[j] + cost); // substitution
        }

        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[b.len()]
}
