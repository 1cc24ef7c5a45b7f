//! Trend and post feeds: search interest, popular videos, recent posts.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::ClientResult;
use crate::http::{HttpClient, HttpClientConfig};
use crate::traits::{InterestFeed, PopularVideoFeed, PostSearch};

pub const SERPAPI_BASE_URL: &str = "https://serpapi.com";
pub const YOUTUBE_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";
pub const X_API_BASE_URL: &str = "https://api.twitter.com/2";
pub const REDDIT_BASE_URL: &str = "https://www.reddit.com";

/// Environment variables holding each feed's fallback key, as read by
/// [`HttpClientConfig::from_env`].
pub const SERPAPI_KEY_VAR: &str = "SERPAPI_API_KEY";
pub const YOUTUBE_KEY_VAR: &str = "YOUTUBE_API_KEY";
pub const X_KEY_VAR: &str = "X_API_KEY";

// ---------------------------------------------------------------------------
// Search interest (SerpApi google_trends engine)
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct TrendsResponse {
    #[serde(default)]
    interest_over_time: Option<InterestOverTime>,
}

#[derive(Deserialize)]
struct InterestOverTime {
    #[serde(default)]
    timeline_data: Vec<TimelinePoint>,
}

#[derive(Deserialize)]
struct TimelinePoint {
    #[serde(default)]
    values: Vec<TimelineValue>,
}

#[derive(Deserialize)]
struct TimelineValue {
    #[serde(default)]
    extracted_value: Option<f64>,
}

/// Interest-over-time for the last seven days.
pub struct SerpApiTrends {
    client: HttpClient,
}

impl SerpApiTrends {
    pub fn new(config: HttpClientConfig) -> ClientResult<Self> {
        Ok(Self {
            client: HttpClient::new(config)?,
        })
    }
}

#[async_trait]
impl InterestFeed for SerpApiTrends {
    async fn interest(&self, term: &str, credential: Option<&str>) -> ClientResult<Vec<f64>> {
        let url = self.client.url("search.json");
        let key = self.client.resolve_key(credential, SERPAPI_KEY_VAR)?;

        let response = self
            .client
            .send(|http| {
                http.get(&url).query(&[
                    ("engine", "google_trends"),
                    ("q", term),
                    ("date", "now 7-d"),
                    ("data_type", "TIMESERIES"),
                    ("api_key", key),
                ])
            })
            .await?;
        let parsed: TrendsResponse = response.json().await?;

        let values: Vec<f64> = parsed
            .interest_over_time
            .map(|iot| {
                iot.timeline_data
                    .into_iter()
                    .filter_map(|p| p.values.into_iter().next().and_then(|v| v.extracted_value))
                    .collect()
            })
            .unwrap_or_default();
        debug!(term, points = values.len(), "Fetched search interest");
        Ok(values)
    }
}

// ---------------------------------------------------------------------------
// Popular videos (YouTube Data API)
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Deserialize)]
struct VideoItem {
    snippet: VideoSnippet,
}

#[derive(Deserialize)]
struct VideoSnippet {
    title: String,
}

/// Most popular videos chart for one region.
pub struct YoutubeCharts {
    client: HttpClient,
    region: String,
    max_results: u32,
}

impl YoutubeCharts {
    pub fn new(config: HttpClientConfig) -> ClientResult<Self> {
        Ok(Self {
            client: HttpClient::new(config)?,
            region: "US".to_string(),
            max_results: 5,
        })
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }
}

#[async_trait]
impl PopularVideoFeed for YoutubeCharts {
    async fn popular_titles(&self, credential: Option<&str>) -> ClientResult<Vec<String>> {
        let url = self.client.url("videos");
        let key = self.client.resolve_key(credential, YOUTUBE_KEY_VAR)?;
        let max_results = self.max_results.to_string();

        let response = self
            .client
            .send(|http| {
                http.get(&url).query(&[
                    ("part", "snippet"),
                    ("chart", "mostPopular"),
                    ("regionCode", self.region.as_str()),
                    ("maxResults", max_results.as_str()),
                    ("key", key),
                ])
            })
            .await?;
        let parsed: VideoListResponse = response.json().await?;

        Ok(parsed.items.into_iter().map(|i| i.snippet.title).collect())
    }
}

// ---------------------------------------------------------------------------
// Recent posts (X API v2)
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct RecentSearchResponse {
    #[serde(default)]
    data: Vec<Tweet>,
}

#[derive(Deserialize)]
struct Tweet {
    text: String,
}

/// X recent search with an app bearer token.
pub struct XRecentSearch {
    client: HttpClient,
    max_results: u32,
}

impl XRecentSearch {
    pub fn new(config: HttpClientConfig) -> ClientResult<Self> {
        Ok(Self {
            client: HttpClient::new(config)?,
            max_results: 10,
        })
    }

    /// Clamped to the API's accepted range of 10..=100.
    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results.clamp(10, 100);
        self
    }
}

#[async_trait]
impl PostSearch for XRecentSearch {
    fn name(&self) -> &str {
        "x"
    }

    async fn search(&self, query: &str, credential: Option<&str>) -> ClientResult<Vec<String>> {
        let url = self.client.url("tweets/search/recent");
        let token = self.client.resolve_key(credential, X_KEY_VAR)?;
        let max_results = self.max_results.to_string();

        let response = self
            .client
            .send(|http| {
                http.get(&url)
                    .bearer_auth(token)
                    .query(&[("query", query), ("max_results", max_results.as_str())])
            })
            .await?;
        let parsed: RecentSearchResponse = response.json().await?;

        Ok(parsed.data.into_iter().map(|t| t.text).collect())
    }
}

// ---------------------------------------------------------------------------
// Recent posts (Reddit public search)
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Post>,
}

#[derive(Deserialize)]
struct Post {
    data: PostData,
}

#[derive(Deserialize)]
struct PostData {
    #[serde(default)]
    title: Option<String>,
}

/// Reddit site-wide search; no credential needed.
pub struct RedditSearch {
    client: HttpClient,
    limit: u32,
}

impl RedditSearch {
    pub fn new(config: HttpClientConfig) -> ClientResult<Self> {
        Ok(Self {
            client: HttpClient::new(config)?,
            limit: 10,
        })
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }
}

#[async_trait]
impl PostSearch for RedditSearch {
    fn name(&self) -> &str {
        "reddit"
    }

    async fn search(&self, query: &str, _credential: Option<&str>) -> ClientResult<Vec<String>> {
        let url = self.client.url("search.json");
        let limit = self.limit.to_string();

        let response = self
            .client
            .send(|http| {
                http.get(&url).query(&[
                    ("q", query),
                    ("limit", limit.as_str()),
                    ("sort", "new"),
                    ("type", "link"),
                ])
            })
            .await?;
        let listing: Listing = response.json().await?;

        Ok(listing
            .data
            .children
            .into_iter()
            .filter_map(|p| p.data.title)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect())
    }
}
