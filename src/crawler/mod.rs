//! Crawl driver for a profile's photo feed
//!
//! One call to [`Crawler::scrape_profile`] walks the whole feed:
//!
//! 1. fetch the profile page,
//! 2. follow its script bundle link to discover the GraphQL query id, and
//!    decode the first page from the inline bootstrap blob,
//! 3. request further pages from the GraphQL endpoint, signing each request,
//!    until a page reports no successor.
//!
//! Every call owns its own [`SessionState`] and [`Aggregator`], so crawls for
//! different profiles can run side by side.

use std::time::Duration;

use thiserror::Error;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::aggregator::Aggregator;
use crate::config::Config;
use crate::constants::{endpoints, headers, PAGE_SIZE};
use crate::models::{CrawlResult, CrawlStop};
use crate::normalizer::normalize_all;
use crate::parser::{
    decode_api_page, decode_bootstrap, extract_bootstrap_json, extract_query_id,
    find_script_link, BootstrapPage, DecodeError, DecodedPage, PageKind,
};
use crate::scraper::{resolve_absolute, FetchResponse, Fetcher, ScraperError};
use crate::signature::maybe_sign;

/// Errors that end a crawl
///
/// Whether an error is fatal depends on when it happens: before the first page
/// is decoded it is returned as `Err`, afterwards it is carried in
/// [`CrawlStop::Interrupted`] next to the posts already collected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CrawlError {
    /// The GraphQL query id could not be found
    #[error("Query id discovery failed: {0}")]
    DiscoveryFailed(DecodeError),

    /// The profile page did not hold a usable first page
    #[error("Bootstrap decode failed: {0}")]
    BootstrapDecodeFailed(DecodeError),

    /// A follow-up JSON page did not have the expected shape
    #[error("Page decode failed: {0}")]
    PageDecodeFailed(DecodeError),

    /// Network, HTTP status or per-request timeout
    #[error("Transport error: {0}")]
    Transport(#[from] ScraperError),

    /// The whole crawl ran past its deadline
    #[error("Crawl exceeded its {0:?} deadline")]
    DeadlineExceeded(Duration),
}

/// Settings for one crawl
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Site root, e.g. `https://www.instagram.com`
    pub base_url: String,
    /// Limit for each individual fetch
    pub page_timeout: Duration,
    /// Limit for the whole crawl
    pub crawl_timeout: Duration,
    /// Posts requested per GraphQL page
    pub page_size: u32,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.instagram.com".to_string(),
            page_timeout: Duration::from_secs(30),
            crawl_timeout: Duration::from_secs(120),
            page_size: PAGE_SIZE,
        }
    }
}

impl From<&Config> for CrawlConfig {
    fn from(config: &Config) -> Self {
        Self {
            base_url: config.instagram_base_url.clone(),
            page_timeout: config.page_timeout,
            crawl_timeout: config.crawl_timeout,
            page_size: PAGE_SIZE,
        }
    }
}

/// Mutable request state carried from page to page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    /// GraphQL query hash, discovered once
    pub query_id: String,
    /// Profile owner id, discovered once
    pub owner_id: String,
    /// Signing seed; empty until the first follow-up request
    pub gis_seed: String,
    /// Variables JSON of the next request, also the signature input
    pub variables_payload: String,
}

impl SessionState {
    pub fn new(query_id: String, owner_id: String) -> Self {
        Self {
            query_id,
            owner_id,
            ..Default::default()
        }
    }

    /// Point the variables payload at the page after `cursor`
    pub fn advance(&mut self, cursor: &str, page_size: u32) {
        self.variables_payload = variables_payload(&self.owner_id, page_size, cursor);
    }
}

/// `{"id":"<owner>","first":<n>,"after":"<cursor>"}`
pub fn variables_payload(owner_id: &str, first: u32, after: &str) -> String {
    format!(
        r#"{{"id":{},"first":{},"after":{}}}"#,
        serde_json::Value::from(owner_id),
        first,
        serde_json::Value::from(after)
    )
}

/// Whether a string looks like an Instagram account handle
pub fn is_valid_handle(handle: &str) -> bool {
    !handle.is_empty()
        && handle.len() <= 30
        && handle
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_')
}

/// Outcome of one follow-up request
enum NextPage {
    Page(DecodedPage),
    NotJson(String),
}

/// Drives crawls through a [`Fetcher`]
pub struct Crawler<F> {
    fetcher: F,
    config: CrawlConfig,
}

impl<F: Fetcher> Crawler<F> {
    pub fn new(fetcher: F, config: CrawlConfig) -> Self {
        Self { fetcher, config }
    }

    /// Crawl every photo post of `handle`.
    ///
    /// Returns `Err` only when nothing could be collected: the query id or the
    /// first page is unavailable. Failures on later pages end the crawl with
    /// the posts gathered so far.
    pub async fn scrape_profile(&self, handle: &str) -> Result<CrawlResult, CrawlError> {
        let deadline = deadline_after(self.config.crawl_timeout);
        let profile_url = endpoints::profile(&self.config.base_url, handle);
        info!("Crawling profile {}", profile_url);

        let root = self
            .fetch(&profile_url, request_headers(handle, None), deadline)
            .await?;
        info!("Fetched {} bytes of profile HTML", root.body.len());

        let (query_id, bootstrap) = tokio::join!(
            self.discover_query_id(&profile_url, &root.body, handle, deadline),
            async { decode_root(&root.body) }
        );
        let query_id = query_id?;
        let mut page: DecodedPage = PageKind::Bootstrap(bootstrap?).into();

        // Owner id and seed come from the bootstrap page only and are never refreshed.
        let owner_id = page.owner_id.take().unwrap_or_default();
        let seed = page.gis.take().unwrap_or_default();
        debug!("Discovered query id {} for owner {}", query_id, owner_id);

        let mut session = SessionState::new(query_id, owner_id);
        let mut aggregator = Aggregator::new();
        let mut page_number = 1;

        loop {
            let added = aggregator.append(normalize_all(&page.nodes));
            info!(
                "Page {}: {} nodes, {} new posts, {} total",
                page_number,
                page.nodes.len(),
                added,
                aggregator.len()
            );

            session.advance(&page.page_info.end_cursor, self.config.page_size);

            if !page.page_info.has_next {
                return Ok(aggregator.finalize(CrawlStop::Exhausted));
            }

            session.gis_seed = seed.clone();

            match self.fetch_next_page(&session, handle, deadline).await {
                Ok(NextPage::Page(next)) => {
                    page = next;
                    page_number += 1;
                }
                Ok(NextPage::NotJson(content_type)) => {
                    warn!(
                        "Page {} returned {}, stopping pagination",
                        page_number + 1,
                        content_type
                    );
                    return Ok(aggregator.finalize(CrawlStop::SkippedNonJson { content_type }));
                }
                Err(e) => {
                    warn!(
                        "Page {} failed, returning {} posts collected so far: {}",
                        page_number + 1,
                        aggregator.len(),
                        e
                    );
                    return Ok(aggregator.finalize(CrawlStop::Interrupted(e)));
                }
            }
        }
    }

    /// Follow the profile's script bundle link and pull the query id out of it
    async fn discover_query_id(
        &self,
        profile_url: &str,
        root_html: &str,
        handle: &str,
        deadline: Instant,
    ) -> Result<String, CrawlError> {
        let href = find_script_link(root_html)
            .ok_or(CrawlError::DiscoveryFailed(DecodeError::ScriptLinkNotFound))?;
        let script_url = resolve_absolute(profile_url, &href)?;
        debug!("Fetching script bundle {}", script_url);

        let bundle = self
            .fetch(script_url.as_str(), request_headers(handle, None), deadline)
            .await?;

        extract_query_id(&bundle.body).map_err(CrawlError::DiscoveryFailed)
    }

    async fn fetch_next_page(
        &self,
        session: &SessionState,
        handle: &str,
        deadline: Instant,
    ) -> Result<NextPage, CrawlError> {
        let url = endpoints::graphql_query(
            &self.config.base_url,
            &session.query_id,
            &session.variables_payload,
        );
        let signature = maybe_sign(&session.gis_seed, &session.variables_payload);
        info!("Next page found {}", url);

        let response = self
            .fetch(&url, request_headers(handle, signature), deadline)
            .await?;

        if !response.is_json() {
            return Ok(NextPage::NotJson(
                response.content_type.unwrap_or_else(|| "no content type".to_string()),
            ));
        }

        let page = decode_api_page(&response.body).map_err(CrawlError::PageDecodeFailed)?;
        Ok(NextPage::Page(PageKind::Api(page).into()))
    }

    /// GET bounded by both the per-page timeout and the crawl deadline
    async fn fetch(
        &self,
        url: &str,
        headers: Vec<(&'static str, String)>,
        deadline: Instant,
    ) -> Result<FetchResponse, CrawlError> {
        let now = Instant::now();
        if now >= deadline {
            return Err(CrawlError::DeadlineExceeded(self.config.crawl_timeout));
        }

        let page_deadline = deadline_after(self.config.page_timeout);
        let request = self.fetcher.fetch(url, &headers);

        let response = if deadline < page_deadline {
            timeout_at(deadline, request)
                .await
                .map_err(|_| CrawlError::DeadlineExceeded(self.config.crawl_timeout))??
        } else {
            timeout_at(page_deadline, request)
                .await
                .map_err(|_| CrawlError::Transport(ScraperError::Timeout))??
        };

        debug!("GET {} -> {} ({} bytes)", url, response.status, response.body.len());
        Ok(response)
    }
}

/// `now + limit`, saturating at roughly 30 years out
fn deadline_after(limit: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(limit)
        .unwrap_or_else(|| now + Duration::from_secs(86400 * 365 * 30))
}

fn decode_root(html: &str) -> Result<BootstrapPage, CrawlError> {
    let json = extract_bootstrap_json(html).map_err(CrawlError::BootstrapDecodeFailed)?;
    decode_bootstrap(&json).map_err(CrawlError::BootstrapDecodeFailed)
}

/// Headers sent with every crawl request; the signature only on signed ones
fn request_headers(handle: &str, signature: Option<String>) -> Vec<(&'static str, String)> {
    let mut request_headers = vec![
        (
            headers::REQUESTED_WITH,
            headers::REQUESTED_WITH_VALUE.to_string(),
        ),
        (headers::REFERRER, endpoints::referrer(handle)),
    ];

    if let Some(signature) = signature {
        request_headers.push((headers::GIS, signature));
    }

    request_headers
}
