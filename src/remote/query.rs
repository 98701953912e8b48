//! Request parameters and URL construction

use reqwest::Url;
use serde::Deserialize;

use super::FetchRequest;

/// HTTP method used to send suggestion requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    /// Parameters go in the query string
    #[default]
    Get,
    /// Parameters go in a form-encoded body
    Post,
}

/// Insertion-ordered key/value map of extra request parameters
///
/// Setting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Remove a parameter, returning its previous value
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = QueryParams::new();
        for (k, v) in iter {
            params.set(k, v);
        }
        params
    }
}

/// Server-side matching hints sent with every request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WireFlags {
    pub use_similar: bool,
    pub multi: bool,
}

/// Build the complete parameter list for one request
///
/// Starts from the base URL's own query, overlays the user parameters, then
/// the wire parameters. Later keys replace earlier ones.
pub(crate) fn request_pairs(
    base: &Url,
    params: &QueryParams,
    request: &FetchRequest,
    flags: WireFlags,
) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = base.query_pairs().into_owned().collect();

    for (key, value) in params.iter() {
        put(&mut pairs, key, value);
    }

    let max_matches = request
        .max_matches
        .map(|n| n.to_string())
        .unwrap_or_else(|| "-1".to_string());

    put(&mut pairs, "token", &request.token);
    put(&mut pairs, "max_matches", &max_matches);
    put(&mut pairs, "use_similar", flag(flags.use_similar));
    if let Some(full) = &request.full_string {
        put(&mut pairs, "fullstring", full);
    }
    put(&mut pairs, "multi", flag(flags.multi));
    pairs
}

/// URL for a GET request carrying all parameters in its query string
pub(crate) fn request_url(base: &Url, pairs: &[(String, String)]) -> Url {
    let mut url = base.clone();
    url.set_query(None);
    url.query_pairs_mut().extend_pairs(pairs);
    url
}

fn put(pairs: &mut Vec<(String, String)>, key: &str, value: &str) {
    pairs.retain(|(k, _)| k != key);
    pairs.push((key.to_string(), value.to_string()));
}

fn flag(on: bool) -> &'static str {
    if on { "1" } else { "0" }
}
