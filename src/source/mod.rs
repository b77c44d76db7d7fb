//! Upstream source abstraction layer.
//!
//! This module defines the [`SourceClient`] trait and the common
//! [`FeedItem`] type. Concrete clients live in sub-modules ([`reddit`] and
//! [`rss`]).
//!
//! ## For contributors: adding a new upstream
//!
//! 1. Create a new file in this directory (e.g. `lemmy.rs`).
//! 2. Define a client struct and implement [`SourceClient`] for it.
//! 3. Add `mod lemmy;` below and re-export your struct in the `pub use` block.
//! 4. Construct it in `main.rs` and hand it to the `SessionStore`.
//!
//! The merger, the extractor chain and the session cache are all
//! source-agnostic.

mod feed_item;
mod reddit;
mod rss;

pub use feed_item::{FeedItem, RankMode};
pub use reddit::{parse_listing, RedditClient};
pub use self::rss::RssClient;

#[cfg(test)]
pub(crate) use feed_item::tests::make_item;

use std::fmt;
use std::str::FromStr;

/// A lazy, possibly endless sequence of items from one named source.
///
/// `None` ends the sequence. An `Err` means the upstream failed; the cursor
/// that owns the sequence treats it as the end of that source.
pub type ItemStream = Box<dyn Iterator<Item = anyhow::Result<FeedItem>> + Send>;

/// Retrieval strategy for a source listing. Opaque to the merger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    #[default]
    Hot,
    New,
    Top,
    Rising,
}

impl FetchMode {
    pub fn as_str(self) -> &'static str {
        match self {
            FetchMode::Hot => "hot",
            FetchMode::New => "new",
            FetchMode::Top => "top",
            FetchMode::Rising => "rising",
        }
    }
}

impl fmt::Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FetchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hot" => Ok(FetchMode::Hot),
            "new" => Ok(FetchMode::New),
            "top" => Ok(FetchMode::Top),
            "rising" => Ok(FetchMode::Rising),
            other => Err(format!(
                "unknown fetch mode '{other}' (expected hot|new|top|rising)"
            )),
        }
    }
}

/// Trait that every upstream client must implement.
///
/// The session layer calls [`fetch_sequence()`](SourceClient::fetch_sequence)
/// once per source name when a session is created. The returned sequence is
/// pulled lazily from whichever thread is paging the session, so both the
/// client and its sequences must be [`Send`].
///
/// ## Implementing a new client
///
/// ```ignore
/// pub struct MyClient { /* config fields */ }
///
/// impl SourceClient for MyClient {
///     fn fetch_sequence(&self, source: &str, mode: FetchMode) -> anyhow::Result<ItemStream> {
///         // Return an iterator that fetches pages on demand.
///         todo!()
///     }
/// }
/// ```
pub trait SourceClient: Send + Sync {
    /// Open a lazy item sequence for `source`.
    ///
    /// Implementations should defer network work to iteration where they
    /// can; errors returned here mean the source could not even be opened.
    fn fetch_sequence(&self, source: &str, mode: FetchMode) -> anyhow::Result<ItemStream>;
}
