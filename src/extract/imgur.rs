//! Imgur single images and albums.
//!
//! Single images are rewritten to the `i.imgur.com` CDN without any
//! request; the last path segment names the image, so `/gallery/<id>`
//! resolves too. Albums (`/a/<id>`) need one lookup to list their images.

use std::sync::Arc;

use serde::Deserialize;
use url::Url;

use super::{parse_on_domain, segments, Extractor};
use crate::error::{Result, StreamError};
use crate::http::JsonFetch;

const CDN: &str = "http://i.imgur.com";

#[derive(Debug, Deserialize)]
struct AlbumResponse {
    data: AlbumData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AlbumData {
    images: Vec<AlbumImage>,
}

#[derive(Debug, Deserialize)]
struct AlbumImage {
    hash: String,
    #[serde(default)]
    ext: String,
}

pub struct ImgurExtractor {
    fetcher: Arc<dyn JsonFetch>,
}

impl ImgurExtractor {
    pub fn new(fetcher: Arc<dyn JsonFetch>) -> Self {
        Self { fetcher }
    }

    fn single_image(url: &Url) -> Vec<String> {
        segments(url)
            .last()
            .map(|image| vec![format!("{CDN}/{image}")])
            .unwrap_or_default()
    }

    fn album(&self, album_id: &str) -> Result<Vec<String>> {
        let endpoint = format!("https://imgur.com/ajaxalbums/getimages/{album_id}/hit.json");
        let body = self.fetcher.get_json(&endpoint)?;
        let album: AlbumResponse = serde_json::from_value(body)
            .map_err(|e| StreamError::Parse(format!("imgur album {album_id}: {e}")))?;
        Ok(album
            .data
            .images
            .into_iter()
            .map(|image| format!("{CDN}/{}{}", image.hash, image.ext))
            .collect())
    }
}

impl Extractor for ImgurExtractor {
    fn name(&self) -> &'static str {
        "imgur"
    }

    fn matches(&self, locator: &str) -> bool {
        parse_on_domain(locator, "imgur.com")
            .is_some_and(|url| !matches!(segments(&url).as_slice(), [] | ["a"]))
    }

    fn extract(&self, locator: &str) -> Result<Vec<String>> {
        let Some(url) = parse_on_domain(locator, "imgur.com") else {
            return Ok(Vec::new());
        };
        match segments(&url).as_slice() {
            ["a", album_id, ..] => self.album(album_id),
            [] | ["a"] => Ok(Vec::new()),
            _ => Ok(Self::single_image(&url)),
        }
    }
}
