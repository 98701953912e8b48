//! typeahead library - caching typeahead match engine
//!
//! Answers match requests from a local cache while throttled requests to a
//! remote suggestion endpoint fill it in the background.

pub mod config;
pub mod engine;
pub mod error;
pub mod remote;
pub mod search;
pub mod suggestion;
pub mod token;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types for convenience
pub use config::Config;
pub use engine::{CachingMatchEngine, EngineOptions, EngineState, RenderOptions};
pub use error::TypeaheadError;
pub use remote::{MatchError, MatchSource, RemoteMatchSource, RemoteOptions};
pub use search::{SearchEvent, TypeaheadSearch};
pub use suggestion::{Payload, RemoteSuggestion};
pub use token::TokenSplitter;
