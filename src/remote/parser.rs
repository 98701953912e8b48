//! Suggestion response parsing
//!
//! Accepts either a bare JSON list or an object of the form
//! `{"matches": [...], "total": N}`. Each element becomes one suggestion.

use std::sync::Arc;

use serde_json::Value;

use super::MatchError;
use crate::suggestion::RemoteSuggestion;

/// Suggestions decoded from one response body
#[derive(Debug, Clone, Default)]
pub struct ParsedMatches {
    pub matches: Vec<Arc<RemoteSuggestion>>,
    /// Total number of matches on the server, when reported
    pub total: Option<u64>,
}

/// Parse a response body into suggestions
///
/// An empty body is treated as "no matches" rather than an error.
pub fn parse_response_text(text: &str) -> Result<ParsedMatches, MatchError> {
    if text.trim().is_empty() {
        return Ok(ParsedMatches::default());
    }

    let json: Value = serde_json::from_str(text).map_err(|e| MatchError::InvalidResponse {
        message: format!("Failed to parse JSON: {}", e),
    })?;

    match json {
        Value::Array(items) => Ok(ParsedMatches {
            matches: into_suggestions(items),
            total: None,
        }),
        Value::Object(mut map) => {
            let items = match map.remove("matches") {
                Some(Value::Array(items)) => items,
                Some(_) => {
                    return Err(MatchError::InvalidResponse {
                        message: "'matches' is not a list".to_string(),
                    });
                }
                None => {
                    return Err(MatchError::InvalidResponse {
                        message: "object response has no 'matches' list".to_string(),
                    });
                }
            };
            let total = map.get("total").and_then(Value::as_u64);
            Ok(ParsedMatches {
                matches: into_suggestions(items),
                total,
            })
        }
        other => Err(MatchError::InvalidResponse {
            message: format!("expected a list or an object, got {}", json_kind(&other)),
        }),
    }
}

fn into_suggestions(items: Vec<Value>) -> Vec<Arc<RemoteSuggestion>> {
    items
        .into_iter()
        .map(|item| Arc::new(RemoteSuggestion::from_value(item)))
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod parser_tests;
