//! rstream: merge ranked content sources into one filtered media stream.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌──────────┐ Upstream ┌──────────┐ FeedItem ┌─────────────┐ MediaPost ┌────────────┐
//! │ source/  │ ───────► │ merge.rs │ ───────► │ pipeline.rs │ ────────► │ session.rs │
//! │ (client) │   x N    │ (k-way)  │          │ (extract/)  │   pages   │ (cache.rs) │
//! └──────────┘          └──────────┘          └─────────────┘           └────────────┘
//! ```
//!
//! * **`source`**: the [`SourceClient`](source::SourceClient) contract and
//!   two concrete clients (Reddit listings, RSS feeds).
//! * **`merge`**: [`StreamMerger`](merge::StreamMerger): one cursor per
//!   source, always yields the highest-ranked buffered item.
//! * **`extract`**: the [`Extractor`](extract::Extractor) contract and the
//!   ordered [`MatcherChain`](extract::MatcherChain).
//! * **`pipeline`**: [`FilterPipeline`](pipeline::FilterPipeline): drops
//!   items no extractor handles, turns the rest into
//!   [`MediaPost`](pipeline::MediaPost)s.
//! * **`cache`**: [`ExpiringCache`](cache::ExpiringCache): sliding-TTL map
//!   with one reaper thread.
//! * **`session`**: [`SessionStore`](session::SessionStore): create, page
//!   through and end sessions.

pub mod cache;
pub mod config;
pub mod error;
pub mod extract;
pub mod http;
pub mod merge;
pub mod pipeline;
pub mod session;
pub mod source;

pub use config::StreamConfig;
pub use error::{Result, StreamError};
pub use pipeline::MediaPost;
pub use session::{Page, SessionStore};
