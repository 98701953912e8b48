//! Client-side suggestion cache
//!
//! Insertion-ordered rows plus a dedup key set. Once the cache grows past its
//! bound it is emptied in one go; there is no incremental eviction.

use std::collections::HashSet;
use std::sync::Arc;

use crate::suggestion::RemoteSuggestion;

/// Default bound on the number of cached suggestions
pub const DEFAULT_MAX_CACHE_SIZE: usize = 1000;

#[derive(Debug)]
pub struct SuggestionCache {
    rows: Vec<Arc<RemoteSuggestion>>,
    keys: HashSet<String>,
    max_size: usize,
}

impl SuggestionCache {
    pub fn new(max_size: usize) -> Self {
        Self {
            rows: Vec::new(),
            keys: HashSet::new(),
            max_size,
        }
    }

    /// Append rows whose dedup key is not cached yet, keeping their order.
    ///
    /// Returns how many rows were added. Existing rows never move.
    pub fn add_rows<I>(&mut self, rows: I) -> usize
    where
        I: IntoIterator<Item = Arc<RemoteSuggestion>>,
    {
        let before = self.rows.len();
        for row in rows {
            if self.keys.insert(row.dedup_key().to_string()) {
                self.rows.push(row);
            }
        }
        self.rows.len() - before
    }

    /// Empty the cache if it holds more than `max_size` rows.
    pub fn clear_if_too_large(&mut self) -> bool {
        if self.rows.len() > self.max_size {
            self.clear();
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.keys.clear();
    }

    pub fn contains(&self, suggestion: &RemoteSuggestion) -> bool {
        self.keys.contains(suggestion.dedup_key())
    }

    pub fn rows(&self) -> &[Arc<RemoteSuggestion>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size;
    }
}

impl Default for SuggestionCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CACHE_SIZE)
    }
}
