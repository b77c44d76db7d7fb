//! Shared blocking HTTP access for upstream listings and extractor lookups.
//!
//! Everything that talks JSON over the network goes through the
//! [`JsonFetch`] trait so tests can substitute canned responses.

use reqwest::blocking::Client;

use crate::config::StreamConfig;
use crate::error::{Result, StreamError};

/// Fetch a URL and decode its body as JSON.
pub trait JsonFetch: Send + Sync {
    fn get_json(&self, url: &str) -> Result<serde_json::Value>;
}

/// Build a blocking [`Client`] with the configured timeout and User-Agent.
///
/// # Errors
///
/// Returns [`StreamError::Http`] if the client cannot be constructed.
pub fn build_client(config: &StreamConfig) -> Result<Client> {
    Client::builder()
        .timeout(config.timeout())
        .user_agent(config.user_agent.clone())
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| StreamError::Http(format!("failed to build HTTP client: {e}")))
}

/// [`JsonFetch`] over a real HTTP client.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &StreamConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config)?,
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl JsonFetch for HttpFetcher {
    fn get_json(&self, url: &str) -> Result<serde_json::Value> {
        tracing::trace!(url, "GET");
        self.client
            .get(url)
            .send()
            .map_err(|e| StreamError::Http(format!("request to {url} failed: {e}")))?
            .error_for_status()
            .map_err(|e| StreamError::Http(format!("{url}: {e}")))?
            .json()
            .map_err(|e| StreamError::Parse(format!("{url}: invalid JSON: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_client_with_default_config() {
        assert!(build_client(&StreamConfig::default()).is_ok());
    }

    #[test]
    fn fetcher_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HttpFetcher>();
    }
}
