//! Gfycat pages and CDN links, rewritten to the GIF rendition.

use super::{parse_on_domain, segments, Extractor};
use crate::error::Result;

const CDN_HOST: &str = "giant.gfycat.com";

/// Resolves `gfycat.com/<Name>` pages and `giant.gfycat.com/<Name>.<ext>`
/// files to `http://giant.gfycat.com/<Name>.gif`. Purely offline.
pub struct GfycatExtractor;

impl GfycatExtractor {
    /// The clip name a locator refers to, if any.
    fn clip_name(locator: &str) -> Option<String> {
        let url = parse_on_domain(locator, "gfycat.com")?;
        let segment = *segments(&url).last()?;
        let (stem, ext) = match segment.split_once('.') {
            Some((stem, ext)) => (stem, ext),
            None => (segment, ""),
        };
        // CDN links always carry a format extension.
        if url.host_str() == Some(CDN_HOST) && ext.is_empty() {
            return None;
        }
        (!stem.is_empty()).then(|| stem.to_string())
    }
}

impl Extractor for GfycatExtractor {
    fn name(&self) -> &'static str {
        "gfycat"
    }

    fn matches(&self, locator: &str) -> bool {
        Self::clip_name(locator).is_some()
    }

    fn extract(&self, locator: &str) -> Result<Vec<String>> {
        Ok(Self::clip_name(locator)
            .map(|name| vec![format!("http://{CDN_HOST}/{name}.gif")])
            .unwrap_or_default())
    }
}
