//! Data models for the Instagram feed scraper
//!
//! Raw feed records as the upstream JSON carries them, the normalized post
//! shape we emit, and the API response wrappers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::crawler::CrawlError;

/// Cursor state of one decoded page
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PageInfo {
    /// Opaque position token for the next request
    #[serde(deserialize_with = "null_as_default")]
    pub end_cursor: String,
    #[serde(rename = "has_next_page", deserialize_with = "null_as_default")]
    pub has_next: bool,
}

/// Wrapper used by every GraphQL edge list
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, bound(deserialize = "T: Deserialize<'de> + Default"))]
pub struct Edge<T> {
    #[serde(deserialize_with = "null_as_default")]
    pub node: T,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CaptionNode {
    #[serde(deserialize_with = "null_as_default")]
    pub text: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CaptionEdges {
    #[serde(deserialize_with = "null_as_default")]
    pub edges: Vec<Edge<CaptionNode>>,
}

/// `{ "count": n }` objects used for likes and comments
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EdgeCount {
    #[serde(deserialize_with = "null_as_default")]
    pub count: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Dimensions {
    #[serde(deserialize_with = "null_as_default")]
    pub width: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub height: u32,
}

/// One raw feed entry before normalization
///
/// Every field defaults when absent or `null`; normalization never fails on
/// a node.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeedNode {
    #[serde(rename = "shortcode", deserialize_with = "null_as_default")]
    pub short_code: String,
    #[serde(rename = "display_url", deserialize_with = "null_as_default")]
    pub image_url: String,
    #[serde(rename = "thumbnail_src", deserialize_with = "null_as_default")]
    pub thumbnail_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub is_video: bool,
    /// Unix timestamp the post was taken at
    #[serde(
        rename = "taken_at_timestamp",
        alias = "date",
        deserialize_with = "null_as_default"
    )]
    pub taken_at: i64,
    pub dimensions: Option<Dimensions>,
    #[serde(rename = "edge_media_to_caption", deserialize_with = "null_as_default")]
    pub captions: CaptionEdges,
    #[serde(rename = "edge_media_preview_like", deserialize_with = "null_as_default")]
    pub likes: EdgeCount,
    #[serde(rename = "edge_media_to_comment", deserialize_with = "null_as_default")]
    pub comments: EdgeCount,
}

impl FeedNode {
    /// Text of the first caption edge, if any
    pub fn first_caption(&self) -> Option<&str> {
        self.captions.edges.first().map(|e| e.node.text.as_str())
    }
}

/// A post in the public output shape
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct NormalizedPost {
    /// First caption of the post, empty when it has none
    pub caption: String,
    /// Full size image URL
    pub image_url: String,
    pub thumbnail_url: String,
    pub likes: u64,
    pub comments: u64,
    /// Public permalink built from the short code
    pub link: String,
}

/// Why a crawl stopped walking pages
#[derive(Debug)]
pub enum CrawlStop {
    /// The last page reported no next page
    Exhausted,
    /// A follow-up response was not JSON, so there was nothing to decode
    SkippedNonJson { content_type: String },
    /// A follow-up page failed; the posts collected so far are kept
    Interrupted(CrawlError),
}

impl CrawlStop {
    pub fn is_complete(&self) -> bool {
        matches!(self, CrawlStop::Exhausted)
    }
}

/// Final result of one profile crawl
#[derive(Debug)]
pub struct CrawlResult {
    /// Posts in arrival order, oldest page first
    pub posts: Vec<NormalizedPost>,
    pub count: usize,
    pub stop: CrawlStop,
}

impl CrawlResult {
    pub fn is_complete(&self) -> bool {
        self.stop.is_complete()
    }

    /// Human readable reason for an incomplete crawl
    pub fn incomplete_reason(&self) -> Option<String> {
        match &self.stop {
            CrawlStop::Exhausted => None,
            CrawlStop::SkippedNonJson { content_type } => Some(format!(
                "Pagination stopped on a non-JSON response ({})",
                content_type
            )),
            CrawlStop::Interrupted(e) => Some(e.to_string()),
        }
    }
}

/// Wire shape of `GET /insta`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct FeedResponse {
    pub posts: Vec<NormalizedPost>,
    pub count: usize,
    /// False when pagination stopped before the last page
    pub complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<CrawlResult> for FeedResponse {
    fn from(result: CrawlResult) -> Self {
        let complete = result.is_complete();
        let error = result.incomplete_reason();
        Self {
            posts: result.posts,
            count: result.count,
            complete,
            error,
        }
    }
}

/// Wire shape of `GET /`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct HomeResponse {
    pub alive: bool,
    pub resources: Vec<String>,
}

impl Default for HomeResponse {
    fn default() -> Self {
        Self {
            alive: true,
            resources: vec!["insta".to_string()],
        }
    }
}

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Whether the operation was successful (always false for errors)
    pub success: bool,
    /// Error message describing what went wrong
    pub error: String,
    /// ISO timestamp of when the error occurred
    pub timestamp: String,
}

impl ApiError {
    /// Create a new API error response with the current timestamp
    pub fn new(error: impl Into<String>) -> Self {
        Self::with_timestamp(error, Utc::now())
    }

    /// Create a new API error response with a custom timestamp
    pub fn with_timestamp(error: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            success: false,
            error: error.into(),
            timestamp: timestamp.to_rfc3339(),
        }
    }
}

/// Treat JSON `null` like a missing field
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
