//! Reply records and the per-post scrape result.

use std::collections::btree_map;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One reply: who wrote it and what they wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyRecord {
    pub author: String,
    pub body: String,
}

impl ReplyRecord {
    pub fn new(author: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            body: body.into(),
        }
    }

    /// Non-empty lines of the body.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.body.lines().map(str::trim).filter(|l| !l.is_empty())
    }

    /// Check the body does not span more than `limit` lines.
    pub fn within_line_limit(&self, limit: usize) -> bool {
        self.lines().count() <= limit
    }

    /// Check whether the same line appears more than once in the body.
    pub fn has_repeated_lines(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        self.lines().any(|line| !seen.insert(line))
    }
}

/// Replies of one post keyed by author handle.
///
/// An author replying twice keeps only the last reply processed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScrapeResult {
    replies: BTreeMap<String, String>,
}

impl ScrapeResult {
    /// Insert a reply, returning the body it replaced if the author was already present.
    pub fn insert(&mut self, author: impl Into<String>, body: impl Into<String>) -> Option<String> {
        self.replies.insert(author.into(), body.into())
    }

    pub fn push(&mut self, record: ReplyRecord) -> Option<String> {
        self.insert(record.author, record.body)
    }

    pub fn get(&self, author: &str) -> Option<&str> {
        self.replies.get(author).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.replies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replies.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.replies.iter()
    }
}

impl<'a> IntoIterator for &'a ScrapeResult {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.replies.iter()
    }
}

impl FromIterator<(String, String)> for ScrapeResult {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            replies: iter.into_iter().collect(),
        }
    }
}
