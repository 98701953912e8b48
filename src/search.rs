//! Explicit full-text search on top of the caching engine
//!
//! Typeahead suggestions come from the engine as the user types; a search
//! is an explicit request (e.g. pressing Enter) that asks the server for
//! every match of the current text and reports the outcome as an event.

use std::time::Instant;

use serde_json::Value;

use crate::engine::CachingMatchEngine;
use crate::remote::{MatchSource, RemoteMatchSource, RequestId};

/// Outcome of a full-text search
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    /// The server found nothing for `token`
    NoMatch { token: String },
    /// Raw payloads of every match, in server order
    Matches { token: String, payloads: Vec<Value> },
}

impl SearchEvent {
    pub fn token(&self) -> &str {
        match self {
            SearchEvent::NoMatch { token } | SearchEvent::Matches { token, .. } => token,
        }
    }
}

/// Typeahead engine plus a search action
pub struct TypeaheadSearch<S: MatchSource = RemoteMatchSource> {
    engine: CachingMatchEngine<S>,
    last_search_token: Option<String>,
}

impl<S: MatchSource> TypeaheadSearch<S> {
    pub fn new(engine: CachingMatchEngine<S>) -> Self {
        Self {
            engine,
            last_search_token: None,
        }
    }

    /// Search for `token` unless it is the token searched last.
    pub fn search(&mut self, token: &str) -> Option<RequestId> {
        if self.last_search_token.as_deref() == Some(token) {
            log::debug!("'{}' was already searched", token);
            return None;
        }
        self.engine.request_full_search(token)
    }

    pub fn tick(&mut self) -> Option<SearchEvent> {
        self.tick_at(Instant::now())
    }

    /// Drive the engine; returns an event when a search completes.
    pub fn tick_at(&mut self, now: Instant) -> Option<SearchEvent> {
        let remote = self.engine.tick_at(now)?;
        self.last_search_token = Some(remote.token.clone());

        if remote.matches.is_empty() {
            return Some(SearchEvent::NoMatch {
                token: remote.token,
            });
        }
        let payloads = remote
            .matches
            .iter()
            .map(|m| m.payload().to_value())
            .collect();
        Some(SearchEvent::Matches {
            token: remote.token,
            payloads,
        })
    }

    pub fn last_search_token(&self) -> Option<&str> {
        self.last_search_token.as_deref()
    }

    pub fn engine(&self) -> &CachingMatchEngine<S> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut CachingMatchEngine<S> {
        &mut self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_helpers::FakeSource;
    use serde_json::json;

    fn search() -> TypeaheadSearch<FakeSource> {
        TypeaheadSearch::new(CachingMatchEngine::new(FakeSource::new()))
    }

    #[test]
    fn test_search_reports_matches() {
        let mut search = search();
        assert!(search.search("gho").is_some());

        search.engine_mut().source_mut().respond(&["ghost", "ghoul"]);
        let event = search.tick().unwrap();

        assert_eq!(
            event,
            SearchEvent::Matches {
                token: "gho".to_string(),
                payloads: vec![json!("ghost"), json!("ghoul")],
            }
        );
        assert_eq!(search.last_search_token(), Some("gho"));
    }

    #[test]
    fn test_search_reports_no_match() {
        let mut search = search();
        search.search("zzz");
        search.engine_mut().source_mut().respond(&[]);

        let event = search.tick().unwrap();
        assert_eq!(event.token(), "zzz");
        assert!(matches!(event, SearchEvent::NoMatch { .. }));
    }

    #[test]
    fn test_repeated_search_is_not_resent() {
        let mut search = search();
        search.search("gho");
        search.engine_mut().source_mut().respond(&["ghost"]);
        search.tick();

        assert_eq!(search.search("gho"), None);
        assert_eq!(search.engine().source().sent.len(), 1);
        assert!(search.search("ghos").is_some());
    }

    #[test]
    fn test_tick_without_search_is_quiet() {
        let mut search = search();
        assert!(search.tick().is_none());
        assert_eq!(search.last_search_token(), None);
    }
}
