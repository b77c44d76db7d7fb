//! Links that already point straight at a media file.

use super::{ext_from_url, Extractor};
use crate::error::Result;

/// Matches URLs whose file extension is in the configured accept list and
/// returns them unchanged.
pub struct DirectLinkExtractor {
    accepted: Vec<String>,
}

impl DirectLinkExtractor {
    pub fn new(accepted_extensions: &[String]) -> Self {
        Self {
            accepted: accepted_extensions
                .iter()
                .map(|ext| ext.to_ascii_lowercase())
                .collect(),
        }
    }
}

impl Extractor for DirectLinkExtractor {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn matches(&self, locator: &str) -> bool {
        let ext = ext_from_url(locator).to_ascii_lowercase();
        !ext.is_empty() && self.accepted.contains(&ext)
    }

    fn extract(&self, locator: &str) -> Result<Vec<String>> {
        if self.matches(locator) {
            Ok(vec![locator.to_string()])
        } else {
            Ok(Vec::new())
        }
    }
}
