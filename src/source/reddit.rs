//! Subreddit listings as upstream sources.
//!
//! Each source name is a subreddit; the [`FetchMode`] picks the listing
//! (`/r/<name>/hot.json`, `/r/<name>/new.json`, ...). Pages are fetched on
//! demand as the sequence is pulled, following the listing's `after`
//! cursor until reddit stops returning one.

use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::DateTime;
use serde::Deserialize;

use super::{FeedItem, FetchMode, ItemStream, SourceClient};
use crate::http::JsonFetch;

const DEFAULT_BASE_URL: &str = "https://www.reddit.com";

/// Listing page size requested from reddit (its maximum).
const PAGE_LIMIT: u32 = 100;

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    after: Option<String>,
    #[serde(default)]
    children: Vec<Thing>,
}

#[derive(Debug, Deserialize)]
struct Thing {
    data: Submission,
}

#[derive(Debug, Deserialize)]
struct Submission {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    created_utc: f64,
    #[serde(default)]
    permalink: String,
    #[serde(default)]
    over_18: bool,
}

/// Parse one listing page into items plus the cursor for the next page.
///
/// This is a pure function (no I/O) so that tests can exercise the parsing
/// logic without hitting the network.
pub fn parse_listing(
    body: serde_json::Value,
    source: &str,
) -> Result<(Vec<FeedItem>, Option<String>)> {
    let listing: Listing = serde_json::from_value(body)?;
    let items = listing
        .data
        .children
        .into_iter()
        .map(|thing| {
            let sub = thing.data;
            let permalink = if sub.permalink.starts_with('/') {
                format!("{DEFAULT_BASE_URL}{}", sub.permalink)
            } else {
                sub.permalink
            };
            FeedItem {
                id: sub.id,
                title: sub.title,
                url: sub.url,
                score: sub.score,
                created: DateTime::from_timestamp(sub.created_utc as i64, 0).unwrap_or_default(),
                permalink,
                nsfw: sub.over_18,
                source_name: source.to_string(),
            }
        })
        .collect();
    Ok((items, listing.data.after))
}

/// Client for subreddit listings.
pub struct RedditClient {
    fetcher: Arc<dyn JsonFetch>,
    base_url: String,
}

impl RedditClient {
    pub fn new(fetcher: Arc<dyn JsonFetch>) -> Self {
        Self::with_base_url(fetcher, DEFAULT_BASE_URL)
    }

    /// Point the client at a different host (mirrors, tests).
    pub fn with_base_url(fetcher: Arc<dyn JsonFetch>, base_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl SourceClient for RedditClient {
    fn fetch_sequence(&self, source: &str, mode: FetchMode) -> Result<ItemStream> {
        if source.is_empty() || !source.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            bail!("invalid subreddit name '{source}'");
        }
        Ok(Box::new(ListingPages {
            fetcher: Arc::clone(&self.fetcher),
            listing_url: format!("{}/r/{source}/{mode}.json", self.base_url),
            source: source.to_string(),
            after: None,
            buffer: VecDeque::new(),
            done: false,
        }))
    }
}

/// Lazily paginated listing. One HTTP request per page, issued only when
/// the buffered page runs dry.
struct ListingPages {
    fetcher: Arc<dyn JsonFetch>,
    listing_url: String,
    source: String,
    after: Option<String>,
    buffer: VecDeque<FeedItem>,
    done: bool,
}

impl ListingPages {
    fn fetch_page(&mut self) -> Result<()> {
        let mut url = format!("{}?limit={PAGE_LIMIT}&raw_json=1", self.listing_url);
        if let Some(after) = &self.after {
            url.push_str("&after=");
            url.push_str(after);
        }

        let body = self.fetcher.get_json(&url)?;
        let (items, after) = parse_listing(body, &self.source)?;
        tracing::debug!(source = %self.source, count = items.len(), "fetched listing page");

        if items.is_empty() || after.is_none() {
            self.done = true;
        }
        self.after = after;
        self.buffer.extend(items);
        Ok(())
    }
}

impl Iterator for ListingPages {
    type Item = Result<FeedItem>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.done {
            if let Err(e) = self.fetch_page() {
                self.done = true;
                return Some(Err(e));
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StreamError;
    use serde_json::json;
    use std::sync::Mutex;

    /// Serves canned pages keyed by the `after` cursor and records requests.
    struct FakeReddit {
        pages: Vec<(Option<&'static str>, serde_json::Value)>,
        requests: Mutex<Vec<String>>,
    }

    impl JsonFetch for FakeReddit {
        fn get_json(&self, url: &str) -> crate::error::Result<serde_json::Value> {
            self.requests.lock().unwrap().push(url.to_string());
            let after = url.split("&after=").nth(1);
            self.pages
                .iter()
                .find(|(cursor, _)| *cursor == after)
                .map(|(_, body)| body.clone())
                .ok_or_else(|| StreamError::Http(format!("404 for {url}")))
        }
    }

    fn page(ids: &[(&str, i64)], after: Option<&str>) -> serde_json::Value {
        let children: Vec<_> = ids
            .iter()
            .map(|(id, score)| {
                json!({"kind": "t3", "data": {
                    "id": id,
                    "title": format!("title {id}"),
                    "url": format!("http://i.imgur.com/{id}.png"),
                    "score": score,
                    "created_utc": 1_500_000_000.0,
                    "permalink": format!("/r/aww/comments/{id}/"),
                    "over_18": false,
                }})
            })
            .collect();
        json!({"kind": "Listing", "data": {"after": after, "children": children}})
    }

    fn client(pages: Vec<(Option<&'static str>, serde_json::Value)>) -> (RedditClient, Arc<FakeReddit>) {
        let fake = Arc::new(FakeReddit {
            pages,
            requests: Mutex::new(Vec::new()),
        });
        (RedditClient::with_base_url(fake.clone(), "http://reddit.test/"), fake)
    }

    #[test]
    fn parse_listing_extracts_items() {
        let (items, after) = parse_listing(page(&[("a1", 10), ("a2", 5)], Some("t3_a2")), "aww").unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "a1");
        assert_eq!(items[0].score, 10);
        assert_eq!(items[0].url, "http://i.imgur.com/a1.png");
        assert_eq!(items[0].source_name, "aww");
        assert_eq!(items[0].permalink, "https://www.reddit.com/r/aww/comments/a1/");
        assert_eq!(items[0].created.timestamp(), 1_500_000_000);
        assert_eq!(after.as_deref(), Some("t3_a2"));
    }

    #[test]
    fn parse_listing_rejects_garbage() {
        assert!(parse_listing(json!({"nope": true}), "aww").is_err());
    }

    #[test]
    fn sequence_is_lazy() {
        let (client, fake) = client(vec![(None, page(&[("a1", 1)], None))]);
        let _seq = client.fetch_sequence("aww", FetchMode::Hot).unwrap();
        assert!(fake.requests.lock().unwrap().is_empty());
    }

    #[test]
    fn sequence_follows_after_cursor() {
        let (client, fake) = client(vec![
            (None, page(&[("a1", 3), ("a2", 2)], Some("t3_a2"))),
            (Some("t3_a2"), page(&[("a3", 1)], None)),
        ]);

        let ids: Vec<String> = client
            .fetch_sequence("aww", FetchMode::New)
            .unwrap()
            .map(|item| item.unwrap().id)
            .collect();

        assert_eq!(ids, vec!["a1", "a2", "a3"]);
        let requests = fake.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].starts_with("http://reddit.test/r/aww/new.json?limit=100"));
        assert!(requests[1].ends_with("&after=t3_a2"));
    }

    #[test]
    fn failing_page_yields_error_then_ends() {
        let (client, _) = client(vec![(None, page(&[("a1", 1)], Some("t3_missing")))]);
        let mut seq = client.fetch_sequence("aww", FetchMode::Hot).unwrap();

        assert_eq!(seq.next().unwrap().unwrap().id, "a1");
        assert!(seq.next().unwrap().is_err());
        assert!(seq.next().is_none());
    }

    #[test]
    fn invalid_subreddit_name_rejected() {
        let (client, _) = client(vec![]);
        assert!(client.fetch_sequence("", FetchMode::Hot).is_err());
        assert!(client.fetch_sequence("../etc", FetchMode::Hot).is_err());
    }
}
