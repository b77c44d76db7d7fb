//! K-way merge of independently paced sources into one ranked sequence.
//!
//! Each upstream sequence is wrapped in a [`SourceCursor`] that buffers its
//! next item. The [`StreamMerger`] repeatedly picks the cursor whose buffered
//! item ranks highest and advances it, so the merged output is ordered by
//! rank, highest first, as long as each source is itself ordered that way.
//!
//! The merge is greedy, not round-robin: a source that stays ahead in rank
//! can supply every item until it runs dry.

use std::iter::FusedIterator;

use serde::Deserialize;

use crate::error::StreamError;

/// A lazy upstream sequence. `Err` ends the sequence for its cursor.
pub type Upstream<T> = Box<dyn Iterator<Item = anyhow::Result<T>> + Send>;

/// What to do with a source whose first pull fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimePolicy {
    /// Log the failure and merge the remaining sources.
    #[default]
    Omit,
    /// Fail the whole merger.
    Fail,
}

// ---------------------------------------------------------------------------
// SourceCursor
// ---------------------------------------------------------------------------

/// One upstream sequence plus its buffered next item.
///
/// Once the upstream ends or errors the cursor is exhausted for good: the
/// upstream is dropped and never polled again.
pub struct SourceCursor<T> {
    name: String,
    upstream: Option<Upstream<T>>,
    next: Option<T>,
}

impl<T> SourceCursor<T> {
    /// Wrap `upstream` and pull its first item.
    ///
    /// An empty upstream yields an already-exhausted cursor. An upstream
    /// error on this first pull is returned to the caller rather than
    /// swallowed, so the merger's constructor can apply its [`PrimePolicy`].
    pub fn prime(name: impl Into<String>, mut upstream: Upstream<T>) -> anyhow::Result<Self> {
        let name = name.into();
        let next = upstream.next().transpose()?;
        if next.is_none() {
            tracing::info!(source = %name, "source is empty");
        } else {
            tracing::info!(source = %name, "created cursor");
        }
        Ok(Self {
            name,
            upstream: next.is_some().then_some(upstream),
            next,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_exhausted(&self) -> bool {
        self.next.is_none()
    }

    /// The buffered item, if any.
    pub fn peek(&self) -> Option<&T> {
        self.next.as_ref()
    }

    /// Rank of the buffered item. An exhausted cursor reports `None`, which
    /// orders below every `Some` rank.
    pub fn peek_rank<K>(&self, rank: impl Fn(&T) -> K) -> Option<K> {
        self.next.as_ref().map(rank)
    }

    /// Hand out the buffered item and refill the buffer from upstream.
    ///
    /// Returns `None` only when the cursor was already exhausted. An upstream
    /// error while refilling exhausts this cursor and nothing else.
    pub fn advance(&mut self) -> Option<T> {
        let current = self.next.take()?;
        match self.upstream.as_mut().and_then(|upstream| upstream.next()) {
            Some(Ok(item)) => self.next = Some(item),
            Some(Err(e)) => {
                tracing::warn!(source = %self.name, error = %e, "source failed, treating as exhausted");
                self.release();
            }
            None => {
                tracing::info!(source = %self.name, "source is expended");
                self.release();
            }
        }
        Some(current)
    }

    fn release(&mut self) {
        self.upstream = None;
    }
}

impl<T> std::fmt::Debug for SourceCursor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceCursor")
            .field("name", &self.name)
            .field("exhausted", &self.is_exhausted())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// StreamMerger
// ---------------------------------------------------------------------------

/// Merges a set of cursors into one sequence ordered by `rank`, highest
/// first. Equal ranks go to the cursor registered first.
///
/// Once every cursor is exhausted the merger returns `None` forever.
pub struct StreamMerger<T, F> {
    cursors: Vec<SourceCursor<T>>,
    rank: F,
    finished: bool,
}

impl<T, K, F> StreamMerger<T, F>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    /// Merge already-primed cursors. Registration order is slice order.
    pub fn new(cursors: Vec<SourceCursor<T>>, rank: F) -> Self {
        Self {
            cursors,
            rank,
            finished: false,
        }
    }

    /// Prime one cursor per `(name, upstream)` pair and merge them.
    ///
    /// An upstream may fail to open (`Err` in the pair) or fail on its first
    /// pull; either way `policy` decides whether the source is dropped or the
    /// whole construction fails.
    pub fn from_sources<I>(sources: I, rank: F, policy: PrimePolicy) -> Result<Self, StreamError>
    where
        I: IntoIterator<Item = (String, anyhow::Result<Upstream<T>>)>,
    {
        let mut cursors = Vec::new();
        for (name, upstream) in sources {
            match upstream.and_then(|up| SourceCursor::prime(name.clone(), up)) {
                Ok(cursor) => cursors.push(cursor),
                Err(e) if policy == PrimePolicy::Omit => {
                    tracing::warn!(source = %name, error = %e, "omitting source that failed to prime");
                }
                Err(e) => {
                    return Err(StreamError::Source {
                        name,
                        message: format!("{e:#}"),
                    });
                }
            }
        }
        tracing::debug!(sources = cursors.len(), "stream merger initialized");
        Ok(Self::new(cursors, rank))
    }

    pub fn cursors(&self) -> &[SourceCursor<T>] {
        &self.cursors
    }

    /// Number of cursors that still have items buffered.
    pub fn live_sources(&self) -> usize {
        self.cursors.iter().filter(|c| !c.is_exhausted()).count()
    }

    /// Index of the cursor to advance next, if any remain.
    fn select(&self) -> Option<usize> {
        let mut best: Option<(usize, K)> = None;
        for (i, cursor) in self.cursors.iter().enumerate() {
            let Some(rank) = cursor.peek_rank(&self.rank) else {
                continue;
            };
            // Strictly greater: on a tie the earlier cursor keeps the slot.
            if best.as_ref().map_or(true, |(_, top)| rank > *top) {
                best = Some((i, rank));
            }
        }
        best.map(|(i, _)| i)
    }
}

impl<T, K, F> Iterator for StreamMerger<T, F>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.finished {
            return None;
        }
        match self.select() {
            Some(i) => self.cursors[i].advance(),
            None => {
                tracing::info!("no further content from merged stream");
                self.finished = true;
                None
            }
        }
    }
}

impl<T, K, F> FusedIterator for StreamMerger<T, F>
where
    K: Ord,
    F: Fn(&T) -> K,
{
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
