//! API Routes module for the Instagram feed scraper
//!
//! This module contains the HTTP route handlers for the public API endpoints.

use std::sync::Arc;

use actix_web::http::header;
use actix_web::middleware::DefaultHeaders;
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use tracing::{error, info, warn};
use utoipa::{IntoParams, OpenApi, ToSchema};

use crate::config::Config;
use crate::crawler::{is_valid_handle, CrawlConfig, Crawler};
use crate::error::{AppError, AppResult};
use crate::models::{ApiError, FeedResponse, HomeResponse, NormalizedPost};
use crate::scraper::Fetcher;

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub crawler: Crawler<Arc<dyn Fetcher>>,
}

impl AppState {
    pub fn new(config: Config, fetcher: Arc<dyn Fetcher>) -> Self {
        let crawler = Crawler::new(fetcher, CrawlConfig::from(&config));
        Self { config, crawler }
    }
}

/// GET / - Service status and available resources
#[utoipa::path(
    get,
    path = "/",
    tag = "status",
    responses(
        (status = 200, description = "Service is alive", body = HomeResponse)
    )
)]
pub async fn home() -> impl Responder {
    HttpResponse::Ok().json(HomeResponse::default())
}

/// Query parameters for the feed endpoint
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct InstaQuery {
    /// Account handle to crawl (defaults to the configured account)
    pub account: Option<String>,
}

/// GET /insta - Crawl every photo post of an account
///
/// Walks all feed pages. When a later page fails the posts collected so far
/// are returned with status 206 and `complete: false`.
#[utoipa::path(
    get,
    path = "/insta",
    tag = "feed",
    params(InstaQuery),
    responses(
        (status = 200, description = "All photo posts of the account", body = FeedResponse),
        (status = 206, description = "Pagination stopped early, posts collected so far", body = FeedResponse),
        (status = 400, description = "Bad request - invalid account handle", body = ApiError),
        (status = 502, description = "Instagram did not provide a usable feed", body = ApiError),
        (status = 504, description = "Crawl timed out before the first page", body = ApiError)
    )
)]
pub async fn get_insta(
    data: web::Data<AppState>,
    query: web::Query<InstaQuery>,
) -> AppResult<HttpResponse> {
    let account = query
        .account
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(data.config.default_account.as_str());

    if !is_valid_handle(account) {
        return Err(AppError::validation(format!(
            "Invalid account handle: {}",
            account
        )));
    }

    info!("Scraping feed of {}", account);

    let result = data.crawler.scrape_profile(account).await.map_err(|e| {
        error!("Failed to scrape {}: {}", account, e);
        AppError::from(e)
    })?;

    let response = FeedResponse::from(result);
    info!("Scraped {} posts from {}", response.count, account);

    if response.complete {
        Ok(HttpResponse::Ok().json(response))
    } else {
        warn!(
            "Returning partial feed for {}: {}",
            account,
            response.error.as_deref().unwrap_or_default()
        );
        Ok(HttpResponse::PartialContent().json(response))
    }
}

/// JSON content type and open CORS on every response
pub fn default_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add((header::CONTENT_TYPE, "application/json"))
        .add((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
        .add((header::ACCESS_CONTROL_ALLOW_METHODS, "GET"))
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Instagram Feed API",
        version = "0.1.0",
        description = "Photo feed of a public Instagram profile as JSON",
        license(
            name = "MIT"
        )
    ),
    paths(
        home,
        get_insta
    ),
    components(
        schemas(
            HomeResponse,
            FeedResponse,
            NormalizedPost,
            ApiError,
            InstaQuery
        )
    ),
    tags(
        (name = "status", description = "Service status"),
        (name = "feed", description = "Profile feed scraping")
    )
)]
pub struct ApiDoc;

/// Configure all routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(home))
        .route("/insta", web::get().to(get_insta));
}
