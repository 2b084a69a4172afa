//! Configuration module for the Instagram feed scraper
//!
//! Handles loading environment variables and application configuration.

use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Account crawled when a request names none
    pub default_account: String,
    /// Site root used for profile and GraphQL URLs
    pub instagram_base_url: String,
    /// Timeout for each individual fetch
    pub page_timeout: Duration,
    /// Deadline for a whole profile crawl
    pub crawl_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 80,
            default_account: "sonia_ehm".to_string(),
            instagram_base_url: "https://www.instagram.com".to_string(),
            page_timeout: Duration::from_secs(30),
            crawl_timeout: Duration::from_secs(120),
        }
    }
}

impl Config {
    /// Load configuration from environment variables, reading `.env` if present
    ///
    /// # Panics
    /// Panics if a numeric variable is set but not a valid number
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_vars<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            host: var("HOST").unwrap_or(defaults.host),
            port: var("PORT")
                .filter(|p| !p.is_empty())
                .map(|p| p.parse().expect("PORT must be a valid number"))
                .unwrap_or(defaults.port),
            default_account: var("INSTAGRAM_ACCOUNT").unwrap_or(defaults.default_account),
            instagram_base_url: var("INSTAGRAM_BASE_URL").unwrap_or(defaults.instagram_base_url),
            page_timeout: var("PAGE_TIMEOUT_SECS")
                .map(|s| {
                    Duration::from_secs(s.parse().expect("PAGE_TIMEOUT_SECS must be a valid number"))
                })
                .unwrap_or(defaults.page_timeout),
            crawl_timeout: var("CRAWL_TIMEOUT_SECS")
                .map(|s| {
                    Duration::from_secs(s.parse().expect("CRAWL_TIMEOUT_SECS must be a valid number"))
                })
                .unwrap_or(defaults.crawl_timeout),
        }
    }

    /// `host:port` to bind the server to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
