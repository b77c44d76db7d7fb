//! Runtime configuration.
//!
//! [`StreamConfig`] is built once at startup and passed explicitly to the
//! pieces that need it ([`MatcherChain::standard`](crate::extract::MatcherChain::standard),
//! [`SessionStore`](crate::session::SessionStore), the HTTP client). Every
//! field has a default, so a TOML file only needs the keys it overrides:
//!
//! ```toml
//! session_ttl_seconds = 120
//! accepted_extensions = [".jpg", ".png"]
//! prime_policy = "fail"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Result, StreamError};
use crate::merge::PrimePolicy;

/// Longest accepted session TTL: one week.
pub const MAX_SESSION_TTL_SECONDS: u64 = crate::cache::MAX_TTL.as_secs();

/// Configuration for sessions, paging, extraction and HTTP access.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Sliding idle timeout for a session, in seconds.
    pub session_ttl_seconds: u64,
    /// Page size used when the caller does not ask for a specific count.
    pub page_size: usize,
    /// Upper bound on a single `pull_next` request.
    pub max_page_size: usize,
    /// HTTP request timeout in seconds, for upstream listings and extractor
    /// lookups alike.
    pub timeout_seconds: u64,
    /// User-Agent sent with every request.
    pub user_agent: String,
    /// File extensions (with leading dot) treated as direct media links.
    pub accepted_extensions: Vec<String>,
    /// What to do with a source that fails while its cursor is primed.
    pub prime_policy: PrimePolicy,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            session_ttl_seconds: 60,
            page_size: 25,
            max_page_size: 100,
            timeout_seconds: 10,
            user_agent: concat!("rstream/", env!("CARGO_PKG_VERSION")).to_string(),
            accepted_extensions: [".jpg", ".jpeg", ".png", ".gif", ".gifv", ".webm", ".mp4"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            prime_policy: PrimePolicy::Omit,
        }
    }
}

impl StreamConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)
            .map_err(|e| StreamError::Config(format!("invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Validates this configuration.
    ///
    /// Checks:
    /// - `session_ttl_seconds`, `page_size` and `timeout_seconds` are non-zero
    /// - `session_ttl_seconds` is at most [`MAX_SESSION_TTL_SECONDS`]
    /// - `page_size` does not exceed `max_page_size`
    /// - `accepted_extensions` is non-empty and every entry starts with `.`
    pub fn validate(&self) -> Result<()> {
        if self.session_ttl_seconds == 0 {
            return Err(StreamError::Config(
                "session_ttl_seconds must be greater than 0".into(),
            ));
        }
        if self.session_ttl_seconds > MAX_SESSION_TTL_SECONDS {
            return Err(StreamError::Config(format!(
                "session_ttl_seconds must be <= {MAX_SESSION_TTL_SECONDS}"
            )));
        }
        if self.page_size == 0 {
            return Err(StreamError::Config("page_size must be greater than 0".into()));
        }
        if self.page_size > self.max_page_size {
            return Err(StreamError::Config(
                "page_size must be <= max_page_size".into(),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(StreamError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.accepted_extensions.is_empty() {
            return Err(StreamError::Config(
                "at least one accepted extension is required".into(),
            ));
        }
        if let Some(bad) = self.accepted_extensions.iter().find(|e| !e.starts_with('.')) {
            return Err(StreamError::Config(format!(
                "accepted extension '{bad}' must start with '.'"
            )));
        }
        Ok(())
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_seconds)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}
