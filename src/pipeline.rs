//! Filtering a merged stream through the extractor chain.
//!
//! [`FilterPipeline`] pulls items from a merged stream one at a time and
//! asks the [`MatcherChain`] for an extractor. Items nothing matches are
//! dropped silently; items whose extraction fails or comes back empty are
//! dropped with a log line. Everything else becomes a [`MediaPost`], in the
//! order the merger produced it.

use std::iter::FusedIterator;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::extract::MatcherChain;
use crate::source::FeedItem;

/// A post that resolved to at least one media link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaPost {
    pub title: String,
    /// The post's original link.
    pub url: String,
    pub permalink: String,
    pub score: i64,
    pub nsfw: bool,
    pub created: DateTime<Utc>,
    pub source: String,
    /// Direct media links, in the extractor's order. Never empty.
    pub media: Vec<String>,
}

impl MediaPost {
    pub fn from_item(item: FeedItem, media: Vec<String>) -> Self {
        Self {
            title: item.title,
            url: item.url,
            permalink: item.permalink,
            score: item.score,
            nsfw: item.nsfw,
            created: item.created,
            source: item.source_name,
            media,
        }
    }
}

/// Outcome of pulling one item from the merged stream.
enum Step {
    Matched(MediaPost),
    Skipped,
    End,
}

/// Forward-only, non-restartable filter over a merged stream.
pub struct FilterPipeline<S> {
    stream: S,
    chain: Arc<MatcherChain>,
    finished: bool,
    consumed: usize,
}

/// The pipeline shape stored in sessions.
pub type BoxedPipeline = FilterPipeline<Box<dyn Iterator<Item = FeedItem> + Send>>;

impl<S> FilterPipeline<S>
where
    S: Iterator<Item = FeedItem>,
{
    pub fn new(stream: S, chain: Arc<MatcherChain>) -> Self {
        Self {
            stream,
            chain,
            finished: false,
            consumed: 0,
        }
    }

    /// Pull up to `count` posts. Returns fewer (possibly none) once the
    /// stream ends; never fails.
    pub fn take_up_to(&mut self, count: usize) -> Vec<MediaPost> {
        self.by_ref().take(count).collect()
    }

    /// Whether the underlying stream has ended.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Raw items pulled from the merged stream so far, matched or not.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    fn step(&mut self) -> Step {
        if self.finished {
            return Step::End;
        }
        let Some(item) = self.stream.next() else {
            self.finished = true;
            return Step::End;
        };
        self.consumed += 1;

        let Some(extractor) = self.chain.resolve(item.locator()) else {
            return Step::Skipped;
        };
        tracing::debug!(extractor = extractor.name(), url = %item.url, "found extractor for url");

        match extractor.extract(item.locator()) {
            Ok(media) if media.is_empty() => Step::Skipped,
            Ok(media) => Step::Matched(MediaPost::from_item(item, media)),
            Err(e) => {
                tracing::warn!(
                    extractor = extractor.name(),
                    locator = %item.url,
                    error = %e,
                    "extraction failed, skipping item"
                );
                Step::Skipped
            }
        }
    }
}

impl<S> Iterator for FilterPipeline<S>
where
    S: Iterator<Item = FeedItem>,
{
    type Item = MediaPost;

    fn next(&mut self) -> Option<MediaPost> {
        loop {
            match self.step() {
                Step::Matched(post) => return Some(post),
                Step::Skipped => continue,
                Step::End => return None,
            }
        }
    }
}

impl<S> FusedIterator for FilterPipeline<S> where S: Iterator<Item = FeedItem> {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
