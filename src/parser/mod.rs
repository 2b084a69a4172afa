//! Parser module for extracting crawl state from Instagram responses
//!
//! Two documents are scraped from HTML: the linked script bundle that holds
//! the GraphQL query id, and the inline `_sharedData` blob that holds the
//! first feed page. Follow-up pages are plain JSON. Both page shapes decode
//! into one [`DecodedPage`] so the crawl loop never looks at raw shapes.

use regex::Regex;
use scraper::{Html, Selector};
use serde::Deserialize;
use std::sync::OnceLock;
use thiserror::Error;

use crate::models::{null_as_default, Edge, FeedNode, PageInfo};

/// Errors produced while decoding scraped documents
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// The script bundle did not contain the query id
    #[error("Query id not found in script bundle")]
    QueryIdNotFound,

    /// The profile page had no `link[as="script"]` to follow
    #[error("Script bundle link not found in profile page")]
    ScriptLinkNotFound,

    /// The bootstrap blob was missing or had no profile page entry
    #[error("Malformed bootstrap page: {0}")]
    MalformedBootstrap(String),

    /// A follow-up GraphQL response did not have the expected shape
    #[error("Malformed API page: {0}")]
    MalformedApiPage(String),
}

/// Timeline container shared by both page shapes
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MediaContainer {
    #[serde(deserialize_with = "null_as_default")]
    edges: Vec<Edge<FeedNode>>,
    #[serde(deserialize_with = "null_as_default")]
    page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
struct BootstrapDocument {
    #[serde(default)]
    rhx_gis: Option<String>,
    entry_data: EntryData,
}

#[derive(Debug, Deserialize)]
struct EntryData {
    #[serde(rename = "ProfilePage", default)]
    profile_page: Vec<ProfilePageEntry>,
}

#[derive(Debug, Deserialize)]
struct ProfilePageEntry {
    graphql: ProfileGraphql,
}

#[derive(Debug, Deserialize)]
struct ProfileGraphql {
    user: BootstrapUser,
}

#[derive(Debug, Deserialize)]
struct BootstrapUser {
    id: String,
    #[serde(rename = "edge_owner_to_timeline_media")]
    media: MediaContainer,
}

#[derive(Debug, Deserialize)]
struct ApiDocument {
    data: ApiData,
}

#[derive(Debug, Deserialize)]
struct ApiData {
    user: ApiUser,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    #[serde(rename = "edge_user_to_photos_of_you")]
    container: MediaContainer,
}

/// First feed page, embedded in the profile HTML
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapPage {
    pub owner_id: String,
    /// Signing seed for every follow-up request of the crawl
    pub gis: Option<String>,
    pub nodes: Vec<FeedNode>,
    pub page_info: PageInfo,
}

/// Follow-up feed page from the GraphQL endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct ApiPage {
    pub nodes: Vec<FeedNode>,
    pub page_info: PageInfo,
}

/// Either page shape
#[derive(Debug, Clone, PartialEq)]
pub enum PageKind {
    Bootstrap(BootstrapPage),
    Api(ApiPage),
}

/// Shape-independent view of a decoded page
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedPage {
    pub owner_id: Option<String>,
    pub gis: Option<String>,
    pub nodes: Vec<FeedNode>,
    pub page_info: PageInfo,
}

impl From<PageKind> for DecodedPage {
    fn from(page: PageKind) -> Self {
        match page {
            PageKind::Bootstrap(p) => DecodedPage {
                owner_id: Some(p.owner_id),
                gis: p.gis,
                nodes: p.nodes,
                page_info: p.page_info,
            },
            PageKind::Api(p) => DecodedPage {
                owner_id: None,
                gis: None,
                nodes: p.nodes,
                page_info: p.page_info,
            },
        }
    }
}

fn into_nodes(edges: Vec<Edge<FeedNode>>) -> Vec<FeedNode> {
    edges.into_iter().map(|e| e.node).collect()
}

/// Decode the `_sharedData` blob of a profile page
pub fn decode_bootstrap(raw_json: &str) -> Result<BootstrapPage, DecodeError> {
    let doc: BootstrapDocument = serde_json::from_str(raw_json)
        .map_err(|e| DecodeError::MalformedBootstrap(e.to_string()))?;

    let entry = doc
        .entry_data
        .profile_page
        .into_iter()
        .next()
        .ok_or_else(|| DecodeError::MalformedBootstrap("no ProfilePage entry".to_string()))?;

    let user = entry.graphql.user;

    Ok(BootstrapPage {
        owner_id: user.id,
        gis: doc.rhx_gis.filter(|s| !s.is_empty()),
        nodes: into_nodes(user.media.edges),
        page_info: user.media.page_info,
    })
}

/// Decode a follow-up GraphQL response
pub fn decode_api_page(raw_json: &str) -> Result<ApiPage, DecodeError> {
    let doc: ApiDocument = serde_json::from_str(raw_json)
        .map_err(|e| DecodeError::MalformedApiPage(e.to_string()))?;

    let container = doc.data.user.container;

    Ok(ApiPage {
        nodes: into_nodes(container.edges),
        page_info: container.page_info,
    })
}

/// Find the href of the first `link[as="script"]` in a page
pub fn find_script_link(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let link_selector = Selector::parse("link[as=\"script\"]").unwrap();

    document
        .select(&link_selector)
        .next()
        .and_then(|el| el.value().attr("href"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Pull the bootstrap JSON out of the first inline script in `<body>`.
///
/// The script reads `window._sharedData = {...};`, so once surrounding
/// whitespace is trimmed the payload runs from the first `{` to one character
/// before the end.
pub fn extract_bootstrap_json(html: &str) -> Result<String, DecodeError> {
    let document = Html::parse_document(html);
    let script_selector = Selector::parse("body > script").unwrap();

    let text = document
        .select(&script_selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .ok_or_else(|| DecodeError::MalformedBootstrap("no inline script in body".to_string()))?;

    let start = text
        .find('{')
        .ok_or_else(|| DecodeError::MalformedBootstrap("no JSON object in script".to_string()))?;

    let mut payload = text[start..].to_string();
    payload.pop();
    Ok(payload)
}

/// Extract the GraphQL query id from the profile script bundle.
///
/// The bundle contains several `queryId:"..."` literals. The first one
/// belongs to an unrelated query; the second is the timeline query. If the
/// bundle layout changes upstream this needs to be revalidated.
pub fn extract_query_id(body: &str) -> Result<String, DecodeError> {
    query_id_pattern()
        .find_iter(body)
        .nth(1)
        .map(|m| m.as_str()[9..41].to_string())
        .ok_or(DecodeError::QueryIdNotFound)
}

fn query_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"queryId:"[0-9A-Za-z]{32}""#).unwrap())
}
