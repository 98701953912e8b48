// Configuration type definitions

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::engine::{
    DEFAULT_MAX_CACHE_SIZE, DEFAULT_REMOTE_MAX_MATCHES, DEFAULT_THROTTLE, EngineOptions,
};
use crate::remote::{HttpMethod, RemoteOptions};

/// Engine configuration section
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,
    #[serde(default = "default_max_cache_size")]
    pub max_cache_size: usize,
    #[serde(default = "default_remote_max_matches")]
    pub remote_max_matches: usize,
    /// Number of suggestions shown for a token
    #[serde(default = "default_display_max_matches")]
    pub display_max_matches: usize,
}

fn default_throttle_ms() -> u64 {
    DEFAULT_THROTTLE.as_millis() as u64
}

fn default_max_cache_size() -> usize {
    DEFAULT_MAX_CACHE_SIZE
}

fn default_remote_max_matches() -> usize {
    DEFAULT_REMOTE_MAX_MATCHES
}

fn default_display_max_matches() -> usize {
    10
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            throttle_ms: default_throttle_ms(),
            max_cache_size: default_max_cache_size(),
            remote_max_matches: default_remote_max_matches(),
            display_max_matches: default_display_max_matches(),
        }
    }
}

impl EngineConfig {
    pub fn options(&self) -> EngineOptions {
        EngineOptions {
            throttle: Duration::from_millis(self.throttle_ms),
            max_cache_size: self.max_cache_size,
            remote_max_matches: self.remote_max_matches,
        }
    }
}

/// Remote source configuration section
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteConfig {
    /// Suggestion endpoint; the token is sent as the `token` parameter
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_use_similar")]
    pub use_similar: bool,
    #[serde(default)]
    pub multi: bool,
    #[serde(default)]
    pub method: HttpMethod,
    /// Request timeout; 0 disables it
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Extra query parameters sent with every request
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

fn default_use_similar() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig {
            url: None,
            use_similar: default_use_similar(),
            multi: false,
            method: HttpMethod::default(),
            timeout_ms: default_timeout_ms(),
            headers: BTreeMap::new(),
            params: BTreeMap::new(),
        }
    }
}

impl RemoteConfig {
    pub fn options(&self) -> RemoteOptions {
        RemoteOptions {
            use_similar: self.use_similar,
            multi: self.multi,
            method: self.method,
            timeout: (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms)),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod types_tests;
