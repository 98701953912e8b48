//! Remote suggestion source
//!
//! Defines the MatchSource seam used by the caching engine, the MatchError
//! taxonomy, and the HTTP-backed RemoteMatchSource. Requests run on a worker
//! thread with its own tokio runtime; completions are polled from a channel.

use std::sync::Arc;

use thiserror::Error;

use crate::suggestion::RemoteSuggestion;

mod parser;
mod query;
mod source;
mod worker;

pub use parser::{ParsedMatches, parse_response_text};
pub use query::{HttpMethod, QueryParams};
pub use source::{RemoteMatchSource, RemoteOptions};

/// Identifier assigned to each dispatched request
pub type RequestId = u64;

/// Errors that can occur while fetching suggestions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum MatchError {
    /// The response body was not a list or a `{matches, total}` object
    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    /// Transport error, timeout, or non-success HTTP status
    #[error("Request failed: {message}")]
    FailedRequest { message: String },

    /// The request was aborted before it completed
    #[error("Request cancelled")]
    Cancelled,

    /// The configured endpoint could not be parsed
    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },
}

/// Receives remote failures, in addition to the regular log output
pub trait ErrorLogger {
    fn log(&self, error: &MatchError);
}

impl<F> ErrorLogger for F
where
    F: Fn(&MatchError),
{
    fn log(&self, error: &MatchError) {
        self(error)
    }
}

/// Parameters for one suggestion request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub token: String,
    /// `None` asks the server for every match
    pub max_matches: Option<usize>,
    /// Complete text of the input element, when it differs from the token
    pub full_string: Option<String>,
}

impl FetchRequest {
    pub fn new(token: impl Into<String>, max_matches: Option<usize>) -> Self {
        Self {
            token: token.into(),
            max_matches,
            full_string: None,
        }
    }
}

/// A settled request, ready to be merged by the engine
///
/// Failed and invalid responses arrive here too, with no matches.
#[derive(Debug, Clone)]
pub struct RemoteMatch {
    pub request_id: RequestId,
    pub token: String,
    pub matches: Vec<Arc<RemoteSuggestion>>,
    pub total: Option<u64>,
}

/// Whether a token is worth sending to the server
pub fn is_fetchable(token: &str) -> bool {
    !token.trim().is_empty()
}

/// Source of remote suggestions driven by the caching engine
pub trait MatchSource {
    /// False for tokens that must not produce a request
    fn should_fetch(&self, token: &str) -> bool {
        is_fetchable(token)
    }

    /// Dispatch a request, aborting the one in flight.
    ///
    /// Returns `None` without touching the in-flight request when
    /// `should_fetch` rejects the token.
    fn fetch(&mut self, request: FetchRequest) -> Option<RequestId>;

    /// Non-blocking poll for the completion of the current request
    fn poll_response(&mut self) -> Option<RemoteMatch>;

    /// Abort the in-flight request, if any. Its completion is never reported.
    fn abort(&mut self);

    /// Extra query parameters merged into every request at fetch time
    fn params_mut(&mut self) -> &mut QueryParams;
}
