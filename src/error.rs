//! Global error handling module for the Instagram feed scraper
//!
//! This module provides a unified error type for the HTTP layer and converts
//! it to responses with a consistent JSON structure. A failed crawl is always
//! reported as an error status, never as an empty post list.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::crawler::CrawlError;
use crate::models::ApiError;
use crate::parser::DecodeError;
use crate::scraper::ScraperError;

/// Application-wide error type that unifies all error sources
#[derive(Debug, Error)]
pub enum AppError {
    /// A crawl that produced no posts at all
    #[error("Crawl error: {0}")]
    Crawl(#[from] CrawlError),

    /// Validation errors (bad request)
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request - Validation errors
            AppError::Validation(_) => StatusCode::BAD_REQUEST,

            // 504 for anything that ran out of time, 502 for other upstream failures
            AppError::Crawl(crawl_err) => match crawl_err {
                CrawlError::DeadlineExceeded(_) | CrawlError::Transport(ScraperError::Timeout) => {
                    StatusCode::GATEWAY_TIMEOUT
                }
                _ => StatusCode::BAD_GATEWAY,
            },
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),

            AppError::Crawl(crawl_err) => match crawl_err {
                CrawlError::DiscoveryFailed(DecodeError::ScriptLinkNotFound) => {
                    "Profile page did not link its script bundle".to_string()
                }
                CrawlError::DiscoveryFailed(_) => {
                    "Could not discover the feed query id".to_string()
                }
                CrawlError::BootstrapDecodeFailed(_) => {
                    "Profile page did not contain a feed, the account may be private or missing"
                        .to_string()
                }
                CrawlError::PageDecodeFailed(msg) => {
                    format!("Unexpected feed page format: {}", msg)
                }
                CrawlError::Transport(ScraperError::HttpError(status)) => {
                    format!("Instagram returned error status: {}", status)
                }
                CrawlError::Transport(ScraperError::RateLimited) => {
                    "Instagram is rate limiting requests, please try again later".to_string()
                }
                CrawlError::Transport(ScraperError::Timeout) => {
                    "Instagram did not respond in time".to_string()
                }
                CrawlError::Transport(e) => format!("Failed to reach Instagram: {}", e),
                CrawlError::DeadlineExceeded(limit) => {
                    format!("Crawl did not finish within {} seconds", limit.as_secs())
                }
            },
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.status_code()
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error_response = ApiError::new(self.user_message());

        HttpResponse::build(status).json(error_response)
    }
}

/// Result type alias for operations that can fail with AppError
pub type AppResult<T> = Result<T, AppError>;
