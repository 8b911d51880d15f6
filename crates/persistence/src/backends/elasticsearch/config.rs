//! Elasticsearch connection configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for an Elasticsearch connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElasticsearchConfig {
    /// Base URL of the store (default: `"http://localhost:9200/"`).
    /// Request paths are resolved relative to it.
    #[serde(default = "default_url")]
    pub url: String,

    /// Request timeout in milliseconds (default: 30000).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Timeout for bulk requests in milliseconds (default: 120000).
    #[serde(default = "default_bulk_timeout_ms")]
    pub bulk_timeout_ms: u64,

    /// Refresh interval restored after a bulk write (default: `"1s"`).
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: String,

    /// Refresh interval set while a bulk write runs (default: `"-1"`, off).
    #[serde(default = "default_disabled_refresh_interval")]
    pub disabled_refresh_interval: String,

    /// Whether search and count requests ask for pretty-printed replies
    /// (default: true).
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

fn default_url() -> String {
    "http://localhost:9200/".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30000
}

fn default_bulk_timeout_ms() -> u64 {
    120000
}

fn default_refresh_interval() -> String {
    "1s".to_string()
}

fn default_disabled_refresh_interval() -> String {
    "-1".to_string()
}

fn default_pretty() -> bool {
    true
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            request_timeout_ms: default_request_timeout_ms(),
            bulk_timeout_ms: default_bulk_timeout_ms(),
            refresh_interval: default_refresh_interval(),
            disabled_refresh_interval: default_disabled_refresh_interval(),
            pretty: default_pretty(),
        }
    }
}

impl ElasticsearchConfig {
    /// Creates a configuration for the store at `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Loads configuration from environment variables.
    ///
    /// Reads `ES_URL`, `ES_REQUEST_TIMEOUT_MS`, `ES_BULK_TIMEOUT_MS` and
    /// `ES_REFRESH_INTERVAL`. Missing or unparseable values keep their
    /// defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("ES_URL").filter(|u| !u.is_empty()) {
            config.url = url;
        }
        if let Some(ms) = lookup("ES_REQUEST_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            config.request_timeout_ms = ms;
        }
        if let Some(ms) = lookup("ES_BULK_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            config.bulk_timeout_ms = ms;
        }
        if let Some(interval) = lookup("ES_REFRESH_INTERVAL").filter(|v| !v.is_empty()) {
            config.refresh_interval = interval;
        }

        config
    }

    /// Returns the base URL with exactly one trailing slash.
    pub fn base_url(&self) -> String {
        format!("{}/", self.url.trim_end_matches('/'))
    }

    /// Returns the request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Returns the bulk request timeout.
    pub fn bulk_timeout(&self) -> Duration {
        Duration::from_millis(self.bulk_timeout_ms)
    }
}
