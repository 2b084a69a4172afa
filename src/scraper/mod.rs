//! Scraper module for fetching pages from instagram.com
//!
//! This module provides the HTTP client used by the crawl. Every request
//! carries the fixed browser user agent; callers add the per-request headers.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::constants::USER_AGENT;

/// Errors that can occur during scraping operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScraperError {
    /// Network-related errors (connection failure, DNS failure, etc.)
    #[error("Failed to connect to server: {0}")]
    NetworkError(String),

    /// The request did not complete in time
    #[error("Request timed out")]
    Timeout,

    /// HTTP non-success status code errors
    #[error("Server returned status {0}")]
    HttpError(u16),

    /// Error reading response body
    #[error("Failed to read response body: {0}")]
    ResponseError(String),

    /// Rate limited by server
    #[error("Rate limited, retry after delay")]
    RateLimited,

    /// A relative link could not be resolved against its page
    #[error("Invalid URL {0}")]
    InvalidUrl(String),
}

/// Result of a successful page fetch
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    /// The HTTP status code
    pub status: u16,
    /// Value of the `Content-Type` response header
    pub content_type: Option<String>,
    /// The raw response body
    pub body: String,
}

impl FetchResponse {
    /// Whether the response declares a JSON content type
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.contains("json"))
            .unwrap_or(false)
    }
}

/// A single GET with extra request headers
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(
        &self,
        url: &str,
        headers: &[(&'static str, String)],
    ) -> Result<FetchResponse, ScraperError>;
}

#[async_trait]
impl<T: Fetcher + ?Sized> Fetcher for Arc<T> {
    async fn fetch(
        &self,
        url: &str,
        headers: &[(&'static str, String)],
    ) -> Result<FetchResponse, ScraperError> {
        (**self).fetch(url, headers).await
    }
}

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Whole-request timeout
    pub request_timeout: Duration,
    /// TCP connect timeout
    pub connect_timeout: Duration,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// reqwest-backed [`Fetcher`]
#[derive(Debug, Clone)]
pub struct Scraper {
    client: Client,
}

impl Scraper {
    /// Create a new Scraper with default configuration
    pub fn new() -> Result<Self, ScraperError> {
        Self::with_config(ScraperConfig::default())
    }

    /// Create a new Scraper with custom configuration
    pub fn with_config(config: ScraperConfig) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ScraperError::NetworkError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for Scraper {
    async fn fetch(
        &self,
        url: &str,
        headers: &[(&'static str, String)],
    ) -> Result<FetchResponse, ScraperError> {
        let mut request = self
            .client
            .get(url)
            .header("Accept", "text/html,application/xhtml+xml,application/json;q=0.9,*/*;q=0.8")
            .header("Accept-Language", "en-US,en;q=0.9");

        for (name, value) in headers {
            request = request.header(*name, value.as_str());
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ScraperError::Timeout
            } else if e.is_connect() {
                ScraperError::NetworkError("Failed to connect to server".to_string())
            } else {
                ScraperError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status();
        let status_code = status.as_u16();

        // Handle rate limiting
        if status_code == 429 {
            return Err(ScraperError::RateLimited);
        }

        if !status.is_success() {
            return Err(ScraperError::HttpError(status_code));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                ScraperError::Timeout
            } else {
                ScraperError::ResponseError(e.to_string())
            }
        })?;

        Ok(FetchResponse {
            status: status_code,
            content_type,
            body,
        })
    }
}

/// Resolve a possibly relative link against the page it was found on
pub fn resolve_absolute(base_url: &str, href: &str) -> Result<Url, ScraperError> {
    let base = Url::parse(base_url).map_err(|_| ScraperError::InvalidUrl(base_url.to_string()))?;
    base.join(href)
        .map_err(|_| ScraperError::InvalidUrl(href.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(content_type: Option<&str>) -> FetchResponse {
        FetchResponse {
            status: 200,
            content_type: content_type.map(|s| s.to_string()),
            body: String::new(),
        }
    }

    #[test]
    fn test_scraper_creation() {
        assert!(Scraper::new().is_ok());
    }

    #[test]
    fn test_default_config() {
        let config = ScraperConfig::default();
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_is_json() {
        assert!(response(Some("application/json; charset=utf-8")).is_json());
        assert!(response(Some("text/javascript; charset=utf-8, application/json")).is_json());
        assert!(!response(Some("text/html; charset=utf-8")).is_json());
        assert!(!response(None).is_json());
    }

    #[test]
    fn test_resolve_relative_link() {
        let url = resolve_absolute(
            "https://www.instagram.com/sonia_ehm",
            "/static/bundles/ProfilePageContainer.js",
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.instagram.com/static/bundles/ProfilePageContainer.js"
        );
    }

    #[test]
    fn test_resolve_absolute_link() {
        let url = resolve_absolute(
            "https://www.instagram.com/sonia_ehm",
            "https://cdn.example.com/bundle.js",
        )
        .unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.com/bundle.js");
    }

    #[test]
    fn test_resolve_invalid_base() {
        assert!(matches!(
            resolve_absolute("not a url", "/x.js"),
            Err(ScraperError::InvalidUrl(_))
        ));
    }
}
