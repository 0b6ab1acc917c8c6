use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

const YOUTUBE_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";
const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";

/// Upper bound the search endpoint accepts for `maxResults`.
pub const MAX_PAGE_SIZE: u32 = 50;

const NO_DESCRIPTION: &str = "No Description";

static WATCH_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]v=([A-Za-z0-9_-]+)").unwrap());
static SHORT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"youtu\.be/([A-Za-z0-9_-]+)").unwrap());
static BARE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").unwrap());

/// A discovered video, annotated later by the evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub title: String,
    pub description: String,
    pub channel: String,
    pub link: String,
    pub qualitative_analysis: Option<String>,
}

impl VideoRecord {
    pub fn from_snippet(video_id: &str, snippet: VideoSnippet) -> Self {
        Self {
            title: snippet.title,
            description: snippet
                .description
                .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            channel: snippet.channel_title,
            link: watch_url(video_id),
            qualitative_analysis: None,
        }
    }

    /// Video id embedded in the watch-URL
    pub fn video_id(&self) -> Option<String> {
        extract_video_id(&self.link)
    }
}

/// Canonical watch-URL for a video id
pub fn watch_url(video_id: &str) -> String {
    format!("{WATCH_URL_PREFIX}{video_id}")
}

/// Extract a video id from a watch-URL, a youtu.be short link, or a bare id
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();
    if let Some(caps) = WATCH_ID_RE.captures(input) {
        return Some(caps[1].to_string());
    }
    if let Some(caps) = SHORT_ID_RE.captures(input) {
        return Some(caps[1].to_string());
    }
    BARE_ID_RE.is_match(input).then(|| input.to_string())
}

/// `publishedAfter` cutoff: `now - days`, RFC 3339 in UTC with a `Z` suffix
pub fn published_after(now: DateTime<Utc>, days: u32) -> String {
    (now - chrono::Duration::days(i64::from(days))).to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// What to search for and how much of it
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub query: String,
    pub days: u32,
    pub max_results: u32,
}

/// One page request against the search endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    pub published_after: String,
    pub max_results: u32,
    pub page_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    #[serde(default)]
    pub items: Vec<SearchItem>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchItem {
    #[serde(default)]
    pub id: SearchItemId,
}

impl SearchItem {
    pub fn video(video_id: &str) -> Self {
        Self {
            id: SearchItemId {
                video_id: Some(video_id.to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchItemId {
    pub video_id: Option<String>,
}

/// Snippet fields consumed from the videos endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSnippet {
    pub title: String,
    pub description: Option<String>,
    pub channel_title: String,
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoListItem>,
}

#[derive(Debug, Deserialize)]
struct VideoListItem {
    snippet: VideoSnippet,
}

/// Search and detail lookups on the video platform
#[async_trait]
pub trait VideoPlatform: Send + Sync {
    async fn search_page(&self, request: &SearchRequest) -> Result<SearchPage>;

    async fn video_snippet(&self, video_id: &str) -> Result<Option<VideoSnippet>>;
}

/// YouTube Data API v3 client
pub struct YouTubeClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl YouTubeClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: YOUTUBE_API_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let response = self
            .client
            .get(format!("{}/{}", self.base_url, endpoint))
            .query(params)
            .query(&[("key", &self.api_key)])
            // Error URLs would carry the key query parameter
            .send()
            .await
            .map_err(|e| Error::Http(e.without_url()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::YouTube(format!("{} failed ({}): {}", endpoint, status, text)));
        }

        response.json().await.map_err(|e| Error::Http(e.without_url()))
    }
}

#[async_trait]
impl VideoPlatform for YouTubeClient {
    async fn search_page(&self, request: &SearchRequest) -> Result<SearchPage> {
        let mut params = vec![
            ("q", request.query.clone()),
            ("part", "snippet".to_string()),
            ("maxResults", request.max_results.to_string()),
            ("type", "video".to_string()),
            ("publishedAfter", request.published_after.clone()),
            ("videoDuration", "long".to_string()),
            ("videoDefinition", "high".to_string()),
            ("order", "relevance".to_string()),
        ];
        if let Some(token) = &request.page_token {
            params.push(("pageToken", token.clone()));
        }

        self.get_json("search", &params).await
    }

    async fn video_snippet(&self, video_id: &str) -> Result<Option<VideoSnippet>> {
        let params = [
            ("part", "snippet,statistics,contentDetails".to_string()),
            ("id", video_id.to_string()),
        ];
        let response: VideoListResponse = self.get_json("videos", &params).await?;
        Ok(response.items.into_iter().next().map(|item| item.snippet))
    }
}

/// Pagination state for one discovery run
#[derive(Debug, Default)]
struct SearchCursor {
    page_token: Option<String>,
    total: u32,
}

/// Page through search results until `max_results` items have been seen or
/// the upstream runs out of pages, looking up each hit's snippet.
///
/// Results keep upstream relevance order. Any upstream error aborts the run.
pub async fn discover(platform: &dyn VideoPlatform, query: &SearchQuery) -> Result<Vec<VideoRecord>> {
    let cutoff = published_after(Utc::now(), query.days);
    let mut cursor = SearchCursor::default();
    let mut results = Vec::new();

    while cursor.total < query.max_results {
        let request = SearchRequest {
            query: query.query.clone(),
            published_after: cutoff.clone(),
            max_results: MAX_PAGE_SIZE.min(query.max_results - cursor.total),
            page_token: cursor.page_token.take(),
        };
        let page = platform.search_page(&request).await?;
        let page_len = page.items.len();
        debug!(items = page_len, total = cursor.total, "fetched search page");

        for item in page.items {
            let Some(video_id) = item.id.video_id else {
                continue;
            };
            match platform.video_snippet(&video_id).await? {
                Some(snippet) => results.push(VideoRecord::from_snippet(&video_id, snippet)),
                None => debug!(video_id = %video_id, "no details returned, skipping"),
            }
        }

        cursor.total = cursor.total.saturating_add(page_len as u32);

        // An empty page with a token would never advance the count
        match page.next_page_token {
            Some(token) if page_len > 0 => cursor.page_token = Some(token),
            _ => break,
        }
    }

    info!(query = %query.query, found = results.len(), "discovery finished");
    Ok(results)
}
