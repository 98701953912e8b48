//! Local matching against cached suggestions
//!
//! Two passes: a word-start prefix pass, and if that finds nothing, a fuzzy
//! pass that scores each row by how well the token aligns as a subsequence.

use std::sync::Arc;

use regex::RegexBuilder;

use crate::suggestion::RemoteSuggestion;

/// Match `token` against `rows`, returning at most `max_matches` rows.
///
/// Prefix matches always win outright; the fuzzy pass only runs when the
/// prefix pass comes back empty.
pub fn local_match(
    token: &str,
    max_matches: usize,
    rows: &[Arc<RemoteSuggestion>],
) -> Vec<Arc<RemoteSuggestion>> {
    if token.trim().is_empty() {
        return Vec::new();
    }

    let matches = prefix_matches(token, max_matches, rows);
    if !matches.is_empty() {
        return matches;
    }
    similar_matches(token, max_matches, rows)
}

/// Rows where `token` starts the text or follows a non-word ASCII character,
/// compared case-insensitively, in cache order.
pub fn prefix_matches(
    token: &str,
    max_matches: usize,
    rows: &[Arc<RemoteSuggestion>],
) -> Vec<Arc<RemoteSuggestion>> {
    if token.trim().is_empty() || max_matches == 0 {
        return Vec::new();
    }

    let pattern = format!(r"(^|[^0-9A-Za-z_]+){}", regex::escape(token));
    let matcher = match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(matcher) => matcher,
        Err(e) => {
            log::warn!("Failed to build prefix matcher for '{}': {}", token, e);
            return Vec::new();
        }
    };

    rows.iter()
        .filter(|row| matcher.is_match(row.display_key()))
        .take(max_matches)
        .cloned()
        .collect()
}

/// The best `max_matches` rows by similarity score.
///
/// Rows scoring `6 * token length` or worse are dropped. Ties keep cache
/// order.
pub fn similar_matches(
    token: &str,
    max_matches: usize,
    rows: &[Arc<RemoteSuggestion>],
) -> Vec<Arc<RemoteSuggestion>> {
    let needle: Vec<char> = token.to_lowercase().chars().collect();
    let threshold = needle.len() * 6;

    let mut scored: Vec<(usize, &Arc<RemoteSuggestion>)> = rows
        .iter()
        .map(|row| (score_chars(&needle, row.display_key()), row))
        .filter(|(score, _)| *score < threshold)
        .collect();

    // Stable sort, so equal scores stay in cache order
    scored.sort_by_key(|(score, _)| *score);

    scored
        .into_iter()
        .take(max_matches)
        .map(|(_, row)| Arc::clone(row))
        .collect()
}

/// Alignment penalty of `token` against `text`; lower is better.
///
/// A contiguous occurrence scores a quarter of its offset. Otherwise each
/// token character is looked up by its first occurrence in the text: one
/// right of the previous hit adds the size of the gap (capped), anything
/// else adds a penalty that grows by 5 each time.
pub fn similarity_score(token: &str, text: &str) -> usize {
    let needle: Vec<char> = token.to_lowercase().chars().collect();
    score_chars(&needle, text)
}

fn score_chars(needle: &[char], text: &str) -> usize {
    let haystack: Vec<char> = text.to_lowercase().chars().collect();

    if let Some(index) = find_chars(&haystack, needle) {
        return index / 4;
    }

    let mut score = 0;
    let mut last_pos: Option<usize> = None;
    let mut penalty = 10;

    for &c in needle {
        let pos = haystack.iter().position(|&h| h == c);
        match (pos, last_pos) {
            (Some(pos), None) => {
                score += pos.min(penalty - 5);
                last_pos = Some(pos);
            }
            (Some(pos), Some(last)) if pos > last => {
                score += (pos - last - 1).min(penalty - 5);
                last_pos = Some(pos);
            }
            _ => {
                score += penalty;
                penalty += 5;
            }
        }
    }

    score
}

fn find_chars(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
#[path = "matcher_tests.rs"]
mod matcher_tests;
