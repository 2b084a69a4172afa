//! Scripted fetcher and page fixtures shared by the crawler and route tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::constants::endpoints;
use crate::crawler::variables_payload;
use crate::scraper::{FetchResponse, Fetcher, ScraperError};

pub const BASE: &str = "https://www.instagram.com";
pub const HANDLE: &str = "sonia_ehm";
pub const SCRIPT_URL: &str = "https://www.instagram.com/static/bundles/es6/ProfilePageContainer.js";
pub const QUERY_ID: &str = "f2405b236d85e8296cf30347c9f08c2a";
pub const SEED: &str = "4f8732eb9ba7d1c8e8897a75d6474d4e";
pub const OWNER: &str = "1234567";

pub type Recorded = (String, Vec<(&'static str, String)>);

/// Replays canned responses by URL and records every request
#[derive(Default)]
pub struct ScriptedFetcher {
    responses: HashMap<String, Result<FetchResponse, ScraperError>>,
    delay: Option<Duration>,
    requests: Mutex<Vec<Recorded>>,
}

impl ScriptedFetcher {
    pub fn respond(mut self, url: &str, response: Result<FetchResponse, ScraperError>) -> Self {
        self.responses.insert(url.to_string(), response);
        self
    }

    /// Hold every response for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(
        &self,
        url: &str,
        headers: &[(&'static str, String)],
    ) -> Result<FetchResponse, ScraperError> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), headers.to_vec()));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .get(url)
            .cloned()
            .unwrap_or(Err(ScraperError::HttpError(404)))
    }
}

/// Value of a recorded request header
pub fn request_header<'a>(request: &'a Recorded, name: &str) -> Option<&'a str> {
    request
        .1
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, v)| v.as_str())
}

pub fn html(body: &str) -> Result<FetchResponse, ScraperError> {
    Ok(FetchResponse {
        status: 200,
        content_type: Some("text/html; charset=utf-8".to_string()),
        body: body.to_string(),
    })
}

pub fn json(body: String) -> Result<FetchResponse, ScraperError> {
    Ok(FetchResponse {
        status: 200,
        content_type: Some("application/json; charset=utf-8".to_string()),
        body,
    })
}

/// `(shortcode, is_video)` pairs as a GraphQL edge list
pub fn edges(nodes: &[(&str, bool)]) -> String {
    let items: Vec<String> = nodes
        .iter()
        .map(|(code, is_video)| {
            format!(
                r#"{{"node": {{"shortcode": "{code}", "display_url": "https://cdn/{code}.jpg",
                    "thumbnail_src": "https://cdn/{code}_t.jpg", "is_video": {is_video},
                    "edge_media_to_caption": {{"edges": [{{"node": {{"text": "caption {code}"}}}}]}},
                    "edge_media_preview_like": {{"count": 10}},
                    "edge_media_to_comment": {{"count": 1}}}}}}"#
            )
        })
        .collect();
    format!("[{}]", items.join(","))
}

/// Profile page HTML with a script bundle link and a `_sharedData` blob
pub fn profile_html(nodes: &[(&str, bool)], has_next: bool, cursor: &str) -> String {
    let shared = format!(
        r#"{{"rhx_gis": "{SEED}", "entry_data": {{"ProfilePage": [{{"graphql": {{"user": {{
            "id": "{OWNER}",
            "edge_owner_to_timeline_media": {{
                "page_info": {{"has_next_page": {has_next}, "end_cursor": "{cursor}"}},
                "edges": {edges}
            }}}}}}}}]}}}}"#,
        edges = edges(nodes)
    );
    format!(
        r#"<!DOCTYPE html><html><head>
        <link rel="preload" href="/static/bundles/es6/ProfilePageContainer.js" as="script" type="text/javascript" crossorigin="anonymous" />
        </head><body>
        <script type="text/javascript">window._sharedData = {shared};</script>
        <script type="text/javascript">window.__initialDataLoaded(window._sharedData);</script>
        </body></html>"#
    )
}

/// Follow-up GraphQL page
pub fn api_page(nodes: &[(&str, bool)], has_next: bool, cursor: &str) -> String {
    format!(
        r#"{{"data": {{"user": {{"edge_user_to_photos_of_you": {{
            "count": 100,
            "page_info": {{"has_next_page": {has_next}, "end_cursor": "{cursor}"}},
            "edges": {edges}
        }}}}}}, "status": "ok"}}"#,
        edges = edges(nodes)
    )
}

/// Script bundle whose second `queryId` is [`QUERY_ID`]
pub fn script_bundle() -> String {
    format!(
        r#"e.exports={{queryId:"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"}};t.timeline={{queryId:"{QUERY_ID}"}};"#
    )
}

pub fn profile_url() -> String {
    endpoints::profile(BASE, HANDLE)
}

/// GraphQL URL requesting the page after `cursor`
pub fn next_url(cursor: &str) -> String {
    endpoints::graphql_query(BASE, QUERY_ID, &variables_payload(OWNER, 50, cursor))
}
