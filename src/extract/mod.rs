//! Extractors: turn a post's link into direct media links.
//!
//! Every extractor implements [`Extractor`]: a cheap, offline
//! [`matches`](Extractor::matches) test on the locator and an
//! [`extract`](Extractor::extract) step that may go to the network (album
//! listings, oEmbed lookups). A [`MatcherChain`] holds the extractors in
//! priority order; the first one that matches a locator handles it.
//!
//! ## For contributors: adding a new host
//!
//! 1. Create a new file in this directory (e.g. `reddit_gallery.rs`).
//! 2. Implement [`Extractor`] for a struct holding whatever it needs (a
//!    [`JsonFetch`] handle if it talks to an API).
//! 3. Register it in [`MatcherChain::standard`]. Position matters: a more
//!    general matcher placed earlier will shadow it.

mod deviantart;
mod direct;
mod gfycat;
mod imgur;

pub use deviantart::DeviantArtExtractor;
pub use direct::DirectLinkExtractor;
pub use gfycat::GfycatExtractor;
pub use imgur::ImgurExtractor;

use std::sync::Arc;

use url::Url;

use crate::config::StreamConfig;
use crate::error::Result;
use crate::http::JsonFetch;

/// A host-specific media resolver.
pub trait Extractor: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Whether this extractor knows how to handle `locator`. Must not do I/O.
    fn matches(&self, locator: &str) -> bool;

    /// Resolve `locator` to zero or more direct media links, in display
    /// order.
    ///
    /// # Errors
    ///
    /// Remote lookup failures. The pipeline logs these and moves on.
    fn extract(&self, locator: &str) -> Result<Vec<String>>;
}

/// Ordered, immutable extractor registry. First match wins.
pub struct MatcherChain {
    extractors: Vec<Box<dyn Extractor>>,
}

impl MatcherChain {
    pub fn new(extractors: Vec<Box<dyn Extractor>>) -> Self {
        Self { extractors }
    }

    /// The built-in registry: direct links, Gfycat, Imgur, DeviantArt.
    pub fn standard(config: &StreamConfig, fetcher: Arc<dyn JsonFetch>) -> Self {
        Self::new(vec![
            Box::new(DirectLinkExtractor::new(&config.accepted_extensions)),
            Box::new(GfycatExtractor),
            Box::new(ImgurExtractor::new(Arc::clone(&fetcher))),
            Box::new(DeviantArtExtractor::new(fetcher)),
        ])
    }

    /// The first extractor that matches `locator`.
    pub fn resolve(&self, locator: &str) -> Option<&dyn Extractor> {
        self.extractors
            .iter()
            .map(|e| e.as_ref())
            .find(|e| e.matches(locator))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.extractors.iter().map(|e| e.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }
}

/// File extension of the URL's last path segment, including the dot.
///
/// The query string and fragment are ignored. Returns `""` when the segment
/// has no extension or the input is not a URL.
pub fn ext_from_url(locator: &str) -> String {
    let Ok(url) = Url::parse(locator) else {
        return String::new();
    };
    let segment = url.path().rsplit('/').next().unwrap_or("");
    match segment.rfind('.') {
        Some(dot) => segment[dot..].to_string(),
        None => String::new(),
    }
}

/// Parse `locator` as an http(s) URL whose host is `domain` or a subdomain
/// of it.
pub(crate) fn parse_on_domain(locator: &str, domain: &str) -> Option<Url> {
    let url = Url::parse(locator).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let host = url.host_str()?.to_ascii_lowercase();
    let on_domain = host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'));
    on_domain.then_some(url)
}

/// Non-empty path segments of `url`.
pub(crate) fn segments(url: &Url) -> Vec<&str> {
    url.path_segments()
        .map(|segs| segs.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}


#[cfg(test)]
mod tests {
    use super::*;
    use testing::Unreachable;

    #[test]
    fn ext_from_url_cases() {
        let cases = [
            ("http://test.com/", ""),
            ("http://test.com/foo", ""),
            ("http://test.com/foo.bar", ".bar"),
            ("http://test.com/foo.bar?baz", ".bar"),
            ("http://test.com/foo.bar?baz=qux", ".bar"),
            ("http://test.com/foo.bar?baz=qux&lorem=ipsem", ".bar"),
            ("not a url", ""),
        ];
        for (url, expected) in cases {
            assert_eq!(ext_from_url(url), expected, "{url}");
        }
    }

    #[test]
    fn parse_on_domain_accepts_subdomains_only() {
        assert!(parse_on_domain("http://imgur.com/x", "imgur.com").is_some());
        assert!(parse_on_domain("https://i.imgur.com/x", "imgur.com").is_some());
        assert!(parse_on_domain("http://notimgur.com/x", "imgur.com").is_none());
        assert!(parse_on_domain("ftp://imgur.com/x", "imgur.com").is_none());
    }

    #[test]
    fn standard_chain_order() {
        let chain = MatcherChain::standard(&StreamConfig::default(), Arc::new(Unreachable));
        assert_eq!(chain.names(), vec!["direct", "gfycat", "imgur", "deviantart"]);
        assert_eq!(chain.len(), 4);
    }

    #[test]
    fn first_match_wins() {
        let chain = MatcherChain::standard(&StreamConfig::default(), Arc::new(Unreachable));

        // A direct .gif on gfycat's CDN matches both; the direct extractor is first.
        let hit = chain.resolve("http://giant.gfycat.com/Foo.gif").unwrap();
        assert_eq!(hit.name(), "direct");

        let hit = chain.resolve("http://imgur.com/a/Foo").unwrap();
        assert_eq!(hit.name(), "imgur");
    }

    #[test]
    fn unmatched_locator_resolves_to_none() {
        let chain = MatcherChain::standard(&StreamConfig::default(), Arc::new(Unreachable));
        assert!(chain.resolve("http://example.com/article").is_none());
        assert!(chain.resolve("").is_none());
    }

    #[test]
    fn empty_chain_matches_nothing() {
        let chain = MatcherChain::new(vec![]);
        assert!(chain.is_empty());
        assert!(chain.resolve("http://i.imgur.com/x.png").is_none());
    }
}
