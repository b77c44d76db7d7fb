//! Session API: one merged, filtered stream per session key.
//!
//! A [`SessionStore`] builds a [`StreamMerger`] over the requested sources,
//! wraps it in a [`FilterPipeline`] and parks it in an [`ExpiringCache`]
//! under a fresh UUID. Callers then page through it with
//! [`pull_next`](SessionStore::pull_next). Sessions idle longer than the
//! configured TTL disappear on their own.
//!
//! The cache lock is held only for the lookup. Pulling (and therefore any
//! extractor network call) happens under the session's own mutex, so a slow
//! session never blocks the others.

use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::cache::ExpiringCache;
use crate::config::StreamConfig;
use crate::error::{Result, StreamError};
use crate::extract::MatcherChain;
use crate::merge::StreamMerger;
use crate::pipeline::{BoxedPipeline, FilterPipeline, MediaPost};
use crate::source::{FeedItem, FetchMode, RankMode, SourceClient};

type SharedPipeline = Arc<Mutex<BoxedPipeline>>;

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    pub posts: Vec<MediaPost>,
    /// The session's stream has ended; later pulls return empty pages.
    pub exhausted: bool,
}

pub struct SessionStore {
    client: Arc<dyn SourceClient>,
    chain: Arc<MatcherChain>,
    config: StreamConfig,
    sessions: ExpiringCache<SharedPipeline>,
}

impl SessionStore {
    pub fn new(client: Arc<dyn SourceClient>, chain: Arc<MatcherChain>, config: StreamConfig) -> Self {
        let sessions = ExpiringCache::new(config.session_ttl());
        Self {
            client,
            chain,
            config,
            sessions,
        }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Open a session over `sources`, ranked by `rank` and fetched in `mode`.
    ///
    /// Each source is opened and primed here. What happens to a source that
    /// fails at this point is decided by the configured prime policy.
    ///
    /// # Errors
    ///
    /// [`StreamError::Source`] when a source fails and the policy is `fail`.
    pub fn create_session(&self, sources: &[String], rank: RankMode, mode: FetchMode) -> Result<String> {
        let upstreams = sources
            .iter()
            .map(|name| (name.clone(), self.client.fetch_sequence(name, mode)));
        let merger = StreamMerger::from_sources(upstreams, rank.key_fn(), self.config.prime_policy)?;
        let live = merger.live_sources();

        let stream: Box<dyn Iterator<Item = FeedItem> + Send> = Box::new(merger);
        let pipeline = FilterPipeline::new(stream, Arc::clone(&self.chain));

        let key = uuid::Uuid::new_v4().to_string();
        self.sessions.set(key.clone(), Arc::new(Mutex::new(pipeline)));
        tracing::info!(
            session = %key,
            sources = sources.len(),
            live,
            rank = %rank,
            mode = %mode,
            "session created"
        );
        Ok(key)
    }

    /// Pull up to `count` posts from a session, sliding its TTL.
    ///
    /// `count` is clamped to `max_page_size`. A short page is not an error;
    /// `exhausted` tells the caller whether more can follow.
    ///
    /// # Errors
    ///
    /// [`StreamError::UnknownSession`] if the key was never issued, was
    /// ended, or has expired.
    pub fn pull_next(&self, key: &str, count: usize) -> Result<Page> {
        let pipeline = self
            .sessions
            .get(key)
            .ok_or_else(|| StreamError::UnknownSession(key.to_string()))?;

        let count = count.min(self.config.max_page_size);
        let mut pipeline = pipeline.lock().unwrap_or_else(|e| e.into_inner());
        let posts = pipeline.take_up_to(count);
        let exhausted = pipeline.is_finished();
        tracing::debug!(
            session = %key,
            requested = count,
            returned = posts.len(),
            consumed = pipeline.consumed(),
            exhausted,
            "page pulled"
        );
        Ok(Page { posts, exhausted })
    }

    /// Pull a page of the configured default size.
    pub fn pull_page(&self, key: &str) -> Result<Page> {
        self.pull_next(key, self.config.page_size)
    }

    /// Drop a session now. Ending an unknown session is a no-op.
    pub fn end_session(&self, key: &str) {
        if self.sessions.delete(key).is_some() {
            tracing::debug!(session = %key, "session ended");
        }
    }

    /// Live sessions, including any due for eviction but not yet reaped.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}
