//! Constants module for the Instagram feed scraper
//!
//! Contains the fixed protocol values and endpoint URL builders that the
//! crawl reproduces exactly.

/// Browser user agent sent on every request
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 6.1) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/41.0.2228.0 Safari/537.36";

/// Number of posts requested per GraphQL page
pub const PAGE_SIZE: u32 = 50;

/// Request header names and fixed values
pub mod headers {
    /// Integrity signature header for paginated GraphQL requests
    pub const GIS: &str = "X-Instagram-GIS";
    pub const REQUESTED_WITH: &str = "X-Requested-With";
    pub const REQUESTED_WITH_VALUE: &str = "XMLHttpRequest";
    /// Note the upstream spelling: this is not the standard `Referer` header.
    pub const REFERRER: &str = "Referrer";
}

/// URL builder functions for all endpoints
pub mod endpoints {
    /// Base used for public post permalinks
    pub const POST_BASE_URL: &str = "https://instagram.com/p/";

    /// Referrer sent with every request of a crawl
    pub const REFERRER_BASE_URL: &str = "https://www.instagram.com/";

    /// Profile root page URL
    pub fn profile(base_url: &str, handle: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), handle)
    }

    /// Paginated GraphQL query URL
    ///
    /// `variables` is the raw JSON payload; it is query-escaped here.
    pub fn graphql_query(base_url: &str, query_id: &str, variables: &str) -> String {
        format!(
            "{}/graphql/query/?query_hash={}&variables={}",
            base_url.trim_end_matches('/'),
            query_id,
            urlencoding::encode(variables)
        )
    }

    /// Permalink for a post short code
    pub fn post_link(short_code: &str) -> String {
        format!("{}{}", POST_BASE_URL, short_code)
    }

    /// Referrer header value for an account
    pub fn referrer(handle: &str) -> String {
        format!("{}{}", REFERRER_BASE_URL, handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_url_trims_trailing_slash() {
        assert_eq!(
            endpoints::profile("https://www.instagram.com/", "sonia_ehm"),
            "https://www.instagram.com/sonia_ehm"
        );
    }

    #[test]
    fn test_graphql_query_escapes_variables() {
        let url = endpoints::graphql_query(
            "https://www.instagram.com",
            "0123456789abcdef0123456789abcdef",
            r#"{"id":"1","first":50,"after":"QVF"}"#,
        );
        assert_eq!(
            url,
            "https://www.instagram.com/graphql/query/?query_hash=0123456789abcdef0123456789abcdef&variables=%7B%22id%22%3A%221%22%2C%22first%22%3A50%2C%22after%22%3A%22QVF%22%7D"
        );
    }

    #[test]
    fn test_post_link() {
        assert_eq!(endpoints::post_link("BxYz"), "https://instagram.com/p/BxYz");
    }

    #[test]
    fn test_referrer() {
        assert_eq!(endpoints::referrer("abc"), "https://www.instagram.com/abc");
    }
}
