//! DeviantArt deviation pages, resolved through the public oEmbed endpoint.

use std::sync::Arc;

use url::Url;

use super::{parse_on_domain, segments, Extractor};
use crate::error::{Result, StreamError};
use crate::http::JsonFetch;

const OEMBED: &str = "https://backend.deviantart.com/oembed";

pub struct DeviantArtExtractor {
    fetcher: Arc<dyn JsonFetch>,
}

impl DeviantArtExtractor {
    pub fn new(fetcher: Arc<dyn JsonFetch>) -> Self {
        Self { fetcher }
    }

    /// `/art/<slug>` on any deviantart host, or `/<user>/art/<slug>`.
    fn is_deviation(url: &Url) -> bool {
        match segments(url).as_slice() {
            ["art", _slug, ..] => true,
            [_user, "art", _slug, ..] => true,
            _ => false,
        }
    }
}

impl Extractor for DeviantArtExtractor {
    fn name(&self) -> &'static str {
        "deviantart"
    }

    fn matches(&self, locator: &str) -> bool {
        parse_on_domain(locator, "deviantart.com").is_some_and(|url| Self::is_deviation(&url))
    }

    fn extract(&self, locator: &str) -> Result<Vec<String>> {
        let endpoint = Url::parse_with_params(OEMBED, [("url", locator)])
            .map_err(|e| StreamError::Parse(format!("oEmbed URL for {locator}: {e}")))?;
        let body = self.fetcher.get_json(endpoint.as_str())?;
        let image = body
            .get("url")
            .and_then(|v| v.as_str())
            .ok_or_else(|| StreamError::Parse(format!("oEmbed response for {locator} has no url")))?;
        Ok(vec![image.to_string()])
    }
}
