//! Accumulation of normalized posts across pages

use std::collections::HashSet;

use crate::constants::endpoints::POST_BASE_URL;
use crate::models::{CrawlResult, CrawlStop, NormalizedPost};

/// Collects posts for one crawl in arrival order.
///
/// A post whose link was already collected from an earlier page is dropped;
/// the first occurrence keeps its position. Posts without a short code have
/// no identity and are always kept.
#[derive(Debug, Default)]
pub struct Aggregator {
    posts: Vec<NormalizedPost>,
    seen: HashSet<String>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a page of posts, returning how many were new
    pub fn append<I>(&mut self, new_posts: I) -> usize
    where
        I: IntoIterator<Item = NormalizedPost>,
    {
        let before = self.posts.len();
        for post in new_posts {
            if post.link == POST_BASE_URL || self.seen.insert(post.link.clone()) {
                self.posts.push(post);
            } else {
                tracing::debug!("Dropping duplicate post {}", post.link);
            }
        }
        self.posts.len() - before
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Close the crawl and produce its result
    pub fn finalize(self, stop: CrawlStop) -> CrawlResult {
        let count = self.posts.len();
        CrawlResult {
            posts: self.posts,
            count,
            stop,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(code: &str) -> NormalizedPost {
        NormalizedPost {
            caption: String::new(),
            image_url: String::new(),
            thumbnail_url: String::new(),
            likes: 0,
            comments: 0,
            link: format!("https://instagram.com/p/{}", code),
        }
    }

    #[test]
    fn test_append_preserves_arrival_order() {
        let mut agg = Aggregator::new();
        assert_eq!(agg.append(vec![post("a"), post("b")]), 2);
        assert_eq!(agg.append(vec![post("c")]), 1);

        let result = agg.finalize(CrawlStop::Exhausted);
        let links: Vec<&str> = result.posts.iter().map(|p| p.link.as_str()).collect();
        assert_eq!(
            links,
            vec![
                "https://instagram.com/p/a",
                "https://instagram.com/p/b",
                "https://instagram.com/p/c"
            ]
        );
        assert_eq!(result.count, 3);
        assert!(result.is_complete());
    }

    #[test]
    fn test_append_drops_duplicates_across_pages() {
        let mut agg = Aggregator::new();
        agg.append(vec![post("a"), post("b")]);
        assert_eq!(agg.append(vec![post("b"), post("c")]), 1);
        assert_eq!(agg.len(), 3);
    }

    #[test]
    fn test_append_keeps_posts_without_short_code() {
        let mut agg = Aggregator::new();
        assert_eq!(agg.append(vec![post(""), post("a"), post("")]), 3);
        assert_eq!(agg.append(vec![post("")]), 1);
        assert_eq!(agg.len(), 4);
    }

    #[test]
    fn test_finalize_empty() {
        let agg = Aggregator::new();
        assert!(agg.is_empty());
        let result = agg.finalize(CrawlStop::Exhausted);
        assert_eq!(result.count, 0);
        assert!(result.posts.is_empty());
    }
}
