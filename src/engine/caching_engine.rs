//! The caching match engine
//!
//! Every `request_matches` call is answered synchronously from the cache.
//! The remote source is triggered through a throttle and its completions are
//! drained by `tick`, which merges them into the cache and appends new rows
//! to the displayed list.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::cache::{DEFAULT_MAX_CACHE_SIZE, SuggestionCache};
use super::matcher::local_match;
use super::throttle::{DEFAULT_THROTTLE, Throttle};
use super::{EngineState, RenderOptions};
use crate::remote::{FetchRequest, MatchSource, RemoteMatch, RemoteMatchSource, RequestId};
use crate::suggestion::RemoteSuggestion;

/// Default number of matches asked from the server per request
pub const DEFAULT_REMOTE_MAX_MATCHES: usize = 100;

/// Query parameter that turns a request into a full-text search
pub const FULL_SEARCH_PARAM: &str = "fullsearch";

/// Receives `(token, matches, options)` whenever the displayed list changes
pub type MatchHandler = Box<dyn FnMut(&str, &[Arc<RemoteSuggestion>], RenderOptions)>;

/// Tunables for a CachingMatchEngine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub throttle: Duration,
    pub max_cache_size: usize,
    pub remote_max_matches: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            throttle: DEFAULT_THROTTLE,
            max_cache_size: DEFAULT_MAX_CACHE_SIZE,
            remote_max_matches: DEFAULT_REMOTE_MAX_MATCHES,
        }
    }
}

/// Caching front for a remote MatchSource
pub struct CachingMatchEngine<S: MatchSource = RemoteMatchSource> {
    source: S,
    cache: SuggestionCache,
    throttle: Throttle,
    remote_max_matches: usize,
    /// Display limit from the most recent request
    cache_max_matches: usize,
    most_recent_token: String,
    most_recent_handler: Option<MatchHandler>,
    /// Rows currently shown for the most recent token
    displayed: Vec<Arc<RemoteSuggestion>>,
    state: EngineState,
    /// Request id of an in-flight full-text search
    pending_search: Option<RequestId>,
    disposed: bool,
}

impl<S: MatchSource> CachingMatchEngine<S> {
    pub fn new(source: S) -> Self {
        Self::with_options(source, EngineOptions::default())
    }

    pub fn with_options(source: S, options: EngineOptions) -> Self {
        Self {
            source,
            cache: SuggestionCache::new(options.max_cache_size),
            throttle: Throttle::new(options.throttle),
            remote_max_matches: options.remote_max_matches,
            cache_max_matches: 10,
            most_recent_token: String::new(),
            most_recent_handler: None,
            displayed: Vec::new(),
            state: EngineState::Ready,
            pending_search: None,
            disposed: false,
        }
    }

    /// Request matches for `token`.
    ///
    /// `handler` is called before this returns with whatever the cache holds,
    /// and again from [`tick`](Self::tick) each time server results change
    /// the list, until a newer request replaces it.
    pub fn request_matches<F>(&mut self, token: &str, max_matches: usize, handler: F)
    where
        F: FnMut(&str, &[Arc<RemoteSuggestion>], RenderOptions) + 'static,
    {
        if self.disposed {
            log::debug!("Ignoring match request for '{}' after dispose", token);
            return;
        }

        self.cache_max_matches = max_matches;
        self.most_recent_token = token.to_string();
        self.most_recent_handler = Some(Box::new(handler));

        self.state = if self.source.should_fetch(token) {
            EngineState::Fetching
        } else {
            EngineState::Ready
        };

        if self.throttle.fire(Instant::now()) {
            self.trigger_remote_match();
        }

        let matches = local_match(token, max_matches, self.cache.rows());
        if let Some(handler) = self.most_recent_handler.as_mut() {
            handler(token, &matches, RenderOptions::default());
        }
        self.displayed = matches;
    }

    /// Drive the engine from the owner's event loop.
    ///
    /// Returns the completed full-text search response, if one arrived.
    pub fn tick(&mut self) -> Option<RemoteMatch> {
        self.tick_at(Instant::now())
    }

    /// [`tick`](Self::tick) with an explicit clock reading
    pub fn tick_at(&mut self, now: Instant) -> Option<RemoteMatch> {
        if self.disposed {
            return None;
        }

        let mut search_result = None;
        while let Some(remote) = self.source.poll_response() {
            if self.pending_search == Some(remote.request_id) {
                self.pending_search = None;
                search_result = Some(remote);
            } else {
                self.on_remote_match(remote);
            }
        }

        if self.throttle.poll(now) {
            self.trigger_remote_match();
        }

        search_result
    }

    /// Send a one-off full-text search for `token`.
    ///
    /// The request carries the full-search flag and no match limit. Its
    /// response is returned by `tick` and never enters the cache.
    pub fn request_full_search(&mut self, token: &str) -> Option<RequestId> {
        if self.disposed {
            return None;
        }

        self.source.params_mut().set(FULL_SEARCH_PARAM, "1");
        let request_id = self.source.fetch(FetchRequest::new(token, None));
        self.source.params_mut().remove(FULL_SEARCH_PARAM);

        if request_id.is_some() {
            log::debug!("Full-text search for '{}' dispatched", token);
            self.pending_search = request_id;
        }
        request_id
    }

    /// Stop all activity and release cached rows.
    ///
    /// Aborts the in-flight request and drops the handler; later calls are
    /// no-ops.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.source.abort();
        self.throttle.cancel();
        self.cache.clear();
        self.displayed.clear();
        self.most_recent_handler = None;
        self.pending_search = None;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn displayed(&self) -> &[Arc<RemoteSuggestion>] {
        &self.displayed
    }

    pub fn most_recent_token(&self) -> &str {
        &self.most_recent_token
    }

    pub fn cache(&self) -> &SuggestionCache {
        &self.cache
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Cache bound; exceeding it empties the cache after the next merge
    pub fn set_max_cache_size(&mut self, max_cache_size: usize) {
        self.cache.set_max_size(max_cache_size);
    }

    /// Replace the throttle. A pending trailing request is dropped.
    pub fn set_throttle_time(&mut self, interval: Duration) {
        self.throttle = Throttle::new(interval);
    }

    pub fn throttle_time(&self) -> Duration {
        self.throttle.interval()
    }

    pub fn set_remote_max_matches(&mut self, max_matches: usize) {
        self.remote_max_matches = max_matches;
    }

    pub fn remote_max_matches(&self) -> usize {
        self.remote_max_matches
    }

    /// Ask the source for matches for the latest token.
    fn trigger_remote_match(&mut self) {
        let request = FetchRequest::new(
            self.most_recent_token.clone(),
            Some(self.remote_max_matches),
        );
        if self.source.fetch(request).is_some() {
            // The new request aborted any search in flight
            self.pending_search = None;
        }
    }

    /// Merge a server response and append new matches to the display.
    ///
    /// Matches are recomputed for the most recent token, which may be newer
    /// than the token the response was requested for.
    fn on_remote_match(&mut self, remote: RemoteMatch) {
        log::debug!(
            "Merging {} server matches for '{}' (current token '{}')",
            remote.matches.len(),
            remote.token,
            self.most_recent_token
        );

        self.cache.add_rows(remote.matches);

        let fresh = local_match(
            &self.most_recent_token,
            self.cache_max_matches,
            self.cache.rows(),
        );

        let mut displayed = self.displayed.clone();
        {
            let shown: HashSet<&str> = self.displayed.iter().map(|m| m.dedup_key()).collect();
            displayed.extend(
                fresh
                    .into_iter()
                    .filter(|m| !shown.contains(m.dedup_key())),
            );
        }
        displayed.truncate(self.cache_max_matches);
        self.displayed = displayed;

        let no_match =
            self.displayed.is_empty() && self.source.should_fetch(&self.most_recent_token);
        self.state = if no_match {
            EngineState::NoMatch
        } else {
            EngineState::Ready
        };

        if let Some(handler) = self.most_recent_handler.as_mut() {
            handler(
                &self.most_recent_token,
                &self.displayed,
                RenderOptions {
                    preserve_highlight: true,
                },
            );
        }

        // Cleared only after dispatch so the rows just shown stay valid
        if self.cache.clear_if_too_large() {
            log::debug!(
                "Suggestion cache exceeded {} rows and was cleared",
                self.cache.max_size()
            );
        }
    }
}

#[cfg(test)]
#[path = "caching_engine_tests.rs"]
mod caching_engine_tests;
