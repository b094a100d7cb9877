//! Post identification from status URLs.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Result, ScrapeError};

fn status_url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^https://(?:www\.)?(?:x|twitter)\.com/(?P<username>\w+)/status/(?P<post_id>\d+)/?(?:[?#].*)?$",
        )
        .expect("status URL pattern is valid")
    })
}

/// The (username, post id) pair a status URL points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PostKey {
    pub username: String,
    pub post_id: String,
    /// Canonical URL for the post, used for navigation.
    pub url: String,
}

impl PostKey {
    /// Parse a status URL.
    ///
    /// Accepts `https://x.com/<username>/status/<id>` (also `twitter.com` and
    /// the `www.` forms), with an optional trailing slash, query or fragment.
    pub fn parse(url: &str) -> Result<Self> {
        let url = url.trim();
        let caps = status_url_pattern()
            .captures(url)
            .ok_or_else(|| ScrapeError::InvalidUrl(url.to_string()))?;

        let username = caps["username"].to_string();
        let post_id = caps["post_id"].to_string();
        Ok(Self {
            url: format!("https://x.com/{}/status/{}", username, post_id),
            username,
            post_id,
        })
    }
}

impl fmt::Display for PostKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.username, self.post_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_url() {
        let key = PostKey::parse("https://x.com/Pop_Kulture1/status/1791844446625018070").unwrap();
        assert_eq!(key.username, "Pop_Kulture1");
        assert_eq!(key.post_id, "1791844446625018070");
        assert_eq!(key.to_string(), "Pop_Kulture1/1791844446625018070");
    }

    #[test]
    fn test_parse_legacy_host_and_query() {
        let key =
            PostKey::parse("https://twitter.com/StopTheCountBot/status/1731861672199909757?s=20")
                .unwrap();
        assert_eq!(key.username, "StopTheCountBot");
        assert_eq!(
            key.url,
            "https://x.com/StopTheCountBot/status/1731861672199909757"
        );
    }

    #[test]
    fn test_rejects_other_shapes() {
        for url in [
            "",
            "https://x.com/Pop_Kulture1",
            "https://x.com/Pop_Kulture1/status/abc",
            "http://x.com/Pop_Kulture1/status/123",
            "https://example.com/Pop_Kulture1/status/123",
            "https://x.com.evil.org/a/status/123",
            "https://x.com/a/likes/123",
        ] {
            assert!(
                matches!(PostKey::parse(url), Err(ScrapeError::InvalidUrl(_))),
                "accepted {url}"
            );
        }
    }
}
