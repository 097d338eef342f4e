use std::time::Duration;

use crate::backend::{ApiResult, HttpBackend};

const DEFAULT_API_URL: &str = "http://localhost:5000/api";
const DEFAULT_APP_ORIGIN: &str = "http://localhost:5173";

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base URL, without trailing slash
    pub api_url: String,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// How often a room view re-reads roster and draw state
    pub poll_interval: Duration,
    /// Public origin of the web app, used for invite links
    pub app_origin: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(15),
            poll_interval: Duration::from_secs(5),
            app_origin: DEFAULT_APP_ORIGIN.to_string(),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn seconds_var(key: &str) -> Option<Duration> {
    let raw = non_empty_var(key)?;
    match raw.parse::<u64>() {
        Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
        _ => {
            tracing::warn!("Ignoring {}={:?}: expected a positive number of seconds", key, raw);
            None
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            api_url: non_empty_var("SANTA_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
            request_timeout: seconds_var("SANTA_API_TIMEOUT").unwrap_or(defaults.request_timeout),
            poll_interval: seconds_var("SANTA_POLL_INTERVAL").unwrap_or(defaults.poll_interval),
            app_origin: non_empty_var("SANTA_APP_ORIGIN")
                .map(|origin| origin.trim_end_matches('/').to_string())
                .unwrap_or(defaults.app_origin),
        }
    }

    /// Build the HTTP backend client for this configuration
    pub fn build_backend(&self) -> ApiResult<HttpBackend> {
        HttpBackend::new(self.api_url.clone(), self.request_timeout)
    }
}
