//! The item type shared across all upstream sources.
//!
//! `FeedItem` represents a single post from any source (a subreddit listing,
//! an RSS feed, ...). Every upstream client converts its native records into
//! `FeedItem`s so the merger, the extractor chain and the session layer stay
//! source-agnostic.
//!
//! ## Ranking
//!
//! `FeedItem` deliberately has no [`Ord`] impl: the order of a merged stream
//! is chosen per session through a [`RankMode`], which projects an item to
//! an integer rank. Higher ranks come first.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

/// A single post, normalised from any upstream source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    /// Source-unique identifier (reddit id, RSS guid, ...).
    pub id: String,

    /// Human-readable headline.
    pub title: String,

    /// The link the post points at. This is the locator the extractor chain
    /// matches against.
    pub url: String,

    /// Community score. Sources without votes report 0.
    pub score: i64,

    /// Creation timestamp.
    pub created: DateTime<Utc>,

    /// Link to the discussion page for the post.
    pub permalink: String,

    /// Flagged as adult content by the source.
    pub nsfw: bool,

    /// Name of the source this came from (e.g. "aww").
    pub source_name: String,
}

impl FeedItem {
    /// The URL-like string extractors match on.
    pub fn locator(&self) -> &str {
        &self.url
    }
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// Which field a merged stream is ordered by, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankMode {
    /// Community score.
    #[default]
    Score,
    /// Creation time, newest first.
    Created,
}

impl RankMode {
    /// Project an item to its rank under this mode.
    pub fn rank(self, item: &FeedItem) -> i64 {
        match self {
            RankMode::Score => item.score,
            RankMode::Created => item.created.timestamp_millis(),
        }
    }

    /// The ranking key function, in the shape the merger takes.
    pub fn key_fn(self) -> impl Fn(&FeedItem) -> i64 + Send + 'static {
        move |item| self.rank(item)
    }
}

impl FromStr for RankMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "score" => Ok(RankMode::Score),
            "created" | "date" => Ok(RankMode::Created),
            other => Err(format!("unknown rank mode '{other}' (expected score|created)")),
        }
    }
}

impl fmt::Display for RankMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankMode::Score => f.write_str("score"),
            RankMode::Created => f.write_str("created"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
