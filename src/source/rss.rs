//! RSS feeds as upstream sources.
//!
//! Source names map to feed URLs configured up front (`--feed NAME=URL`).
//! A feed has no votes, so every item scores 0; merge RSS sources with
//! [`RankMode::Created`](super::RankMode::Created) for a meaningful order.
//!
//! The feed is fetched on the first pull, not when the sequence is opened.

use std::collections::HashMap;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use reqwest::blocking::Client;

use super::{FeedItem, FetchMode, ItemStream, SourceClient};

/// Client for a fixed set of named RSS feeds.
pub struct RssClient {
    client: Client,
    feeds: HashMap<String, String>,
}

impl RssClient {
    /// Create a client over `(name, url)` pairs.
    pub fn new(client: Client, feeds: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            client,
            feeds: feeds.into_iter().collect(),
        }
    }

    /// Parse an already-fetched [`rss::Channel`] into [`FeedItem`]s.
    ///
    /// [`FetchMode::New`] reorders newest first; every other mode keeps the
    /// publisher's document order.
    pub fn parse_channel(channel: &rss::Channel, label: &str, mode: FetchMode) -> Vec<FeedItem> {
        let mut items: Vec<FeedItem> = channel
            .items()
            .iter()
            .map(|item| {
                // Prefer <guid>, fall back to <link>, then empty string.
                let id = item
                    .guid()
                    .map(|g| g.value().to_string())
                    .or_else(|| item.link().map(String::from))
                    .unwrap_or_default();

                let created = item
                    .pub_date()
                    .and_then(|d| DateTime::parse_from_rfc2822(d).ok())
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_default();

                let link = item.link().unwrap_or_default().to_string();

                FeedItem {
                    id,
                    title: item.title().unwrap_or("(untitled)").to_string(),
                    url: link.clone(),
                    score: 0,
                    created,
                    permalink: link,
                    nsfw: false,
                    source_name: label.to_string(),
                }
            })
            .collect();

        if mode == FetchMode::New {
            items.sort_by(|a, b| b.created.cmp(&a.created));
        }
        items
    }
}

fn fetch_channel(client: &Client, url: &str, label: &str, mode: FetchMode) -> Result<Vec<FeedItem>> {
    let body = client.get(url).send()?.error_for_status()?.bytes()?;
    let channel = rss::Channel::read_from(body.as_ref())?;
    let items = RssClient::parse_channel(&channel, label, mode);
    tracing::debug!(feed = label, count = items.len(), "fetched RSS channel");
    Ok(items)
}

impl SourceClient for RssClient {
    fn fetch_sequence(&self, source: &str, mode: FetchMode) -> Result<ItemStream> {
        let url = self
            .feeds
            .get(source)
            .cloned()
            .ok_or_else(|| anyhow!("no feed configured under '{source}'"))?;
        let client = self.client.clone();
        let label = source.to_string();

        let items = std::iter::once_with(move || fetch_channel(&client, &url, &label, mode))
            .flat_map(|fetched| match fetched {
                Ok(items) => items.into_iter().map(Ok).collect::<Vec<_>>(),
                Err(e) => vec![Err(e)],
            });
        Ok(Box::new(items))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
