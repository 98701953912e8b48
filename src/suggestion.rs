//! Remote suggestion values
//!
//! Wraps one item returned by the suggestion server. The display key is
//! resolved once at construction so matching and deduplication never need
//! to inspect the payload again.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde_json::Value;

/// Prefix that turns a display key into a dedup key
const DEDUP_SENTINEL: char = ' ';

/// The shape of a suggestion item as it arrived from the server
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// JSON `null`
    Null,
    /// A bare string item
    Text(String),
    /// An object carrying a non-null `caption` field
    Captioned { caption: Value, data: Value },
    /// Any other value (object without caption, number, bool, array)
    Opaque(Value),
}

impl Payload {
    /// Classify a raw JSON item
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Null => Payload::Null,
            Value::String(s) => Payload::Text(s),
            Value::Object(ref map) => match map.get("caption") {
                Some(caption) if !caption.is_null() => Payload::Captioned {
                    caption: caption.clone(),
                    data: value,
                },
                _ => Payload::Opaque(value),
            },
            other => Payload::Opaque(other),
        }
    }

    /// Text shown to the user for this payload
    fn display_text(&self) -> String {
        match self {
            Payload::Null => String::new(),
            Payload::Text(s) => s.clone(),
            Payload::Captioned {
                caption: Value::String(s),
                ..
            } => s.clone(),
            Payload::Captioned { caption, .. } => caption.to_string(),
            Payload::Opaque(value) => value.to_string(),
        }
    }

    /// The payload as plain JSON, the way the server sent it
    pub fn to_value(&self) -> Value {
        match self {
            Payload::Null => Value::Null,
            Payload::Text(s) => Value::String(s.clone()),
            Payload::Captioned { data, .. } => data.clone(),
            Payload::Opaque(value) => value.clone(),
        }
    }
}

/// One immutable suggestion item
///
/// Two suggestions are equal when their display keys are equal, regardless
/// of the rest of the payload.
#[derive(Debug, Clone)]
pub struct RemoteSuggestion {
    payload: Payload,
    display_key: String,
    dedup_key: String,
}

impl RemoteSuggestion {
    pub fn new(payload: Payload) -> Self {
        let display_key = payload.display_text();
        let mut dedup_key = String::with_capacity(display_key.len() + 1);
        dedup_key.push(DEDUP_SENTINEL);
        dedup_key.push_str(&display_key);
        Self {
            payload,
            display_key,
            dedup_key,
        }
    }

    pub fn from_value(value: Value) -> Self {
        Self::new(Payload::from_value(value))
    }

    /// Convenience constructor for a plain string suggestion
    pub fn text(s: impl Into<String>) -> Self {
        Self::new(Payload::Text(s.into()))
    }

    pub fn display_key(&self) -> &str {
        &self.display_key
    }

    pub fn dedup_key(&self) -> &str {
        &self.dedup_key
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }
}

impl PartialEq for RemoteSuggestion {
    fn eq(&self, other: &Self) -> bool {
        self.display_key == other.display_key
    }
}

impl Eq for RemoteSuggestion {}

impl Hash for RemoteSuggestion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.display_key.hash(state);
    }
}

impl fmt::Display for RemoteSuggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_key)
    }
}
