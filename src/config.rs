//! Client configuration

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Where the backend lives and how long to wait for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// `None` waits indefinitely
    pub request_timeout: Option<Duration>,
    pub export_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            export_dir: PathBuf::from("."),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or unparsable values use defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            base_url: lookup("CHAT_API_BASE_URL")
                .filter(|url| !url.trim().is_empty())
                .unwrap_or(defaults.base_url),
            request_timeout: match lookup("CHAT_REQUEST_TIMEOUT_SECS") {
                Some(raw) => parse_timeout(&raw).unwrap_or(defaults.request_timeout),
                None => defaults.request_timeout,
            },
            export_dir: lookup("CHAT_EXPORT_DIR")
                .map_or(defaults.export_dir, PathBuf::from),
        }
    }
}

/// Seconds; `0` disables the timeout. `None` when unparsable.
#[allow(clippy::option_option)]
pub fn parse_timeout(raw: &str) -> Option<Option<Duration>> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Some(None),
        Ok(secs) => Some(Some(Duration::from_secs(secs))),
        Err(_) => {
            tracing::warn!(value = %raw, "Ignoring invalid request timeout");
            None
        }
    }
}
