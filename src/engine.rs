//! Caching match engine
//!
//! Answers match requests synchronously from a local cache, throttles
//! requests to the remote source, and merges server results into what is
//! already displayed without moving or dropping visible rows.

mod cache;
mod caching_engine;
pub mod matcher;
mod throttle;

pub use cache::{DEFAULT_MAX_CACHE_SIZE, SuggestionCache};
pub use caching_engine::{
    CachingMatchEngine, DEFAULT_REMOTE_MAX_MATCHES, EngineOptions, FULL_SEARCH_PARAM,
    MatchHandler,
};
pub use matcher::local_match;
pub use throttle::{DEFAULT_THROTTLE, Throttle};

/// What the engine is currently waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    /// A server request for the current token is pending
    Fetching,
    /// The server answered and nothing matches the current token
    NoMatch,
    /// Displayed matches are up to date
    #[default]
    Ready,
}

/// Rendering hints passed along with every match list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderOptions {
    /// Keep the highlighted row; set when server results were appended to
    /// an already displayed list
    pub preserve_highlight: bool,
}
