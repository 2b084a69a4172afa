//! Instagram Feed Scraper Library
//!
//! This library crawls the photo feed of a public Instagram profile through
//! the site's internal GraphQL pagination and exposes it through a REST API.

pub mod aggregator;
pub mod config;
pub mod constants;
pub mod crawler;
pub mod error;
pub mod models;
pub mod normalizer;
pub mod parser;
pub mod routes;
pub mod scraper;
pub mod signature;

#[cfg(test)]
mod test_support;
