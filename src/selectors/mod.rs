//! Location selectors for reply containers, authors and bodies.
//!
//! The site's markup drifts, so the selectors live in a file next to the
//! scraped data and are re-derived by [`repair`] when they go stale.

mod path;
pub mod repair;
mod store;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use path::{LocationPath, PathStep, StepAttr};
pub use repair::{derive_selector, ReferencePost, RepairedSelectors};
pub use store::SelectorStore;

/// The three selectors the scraper relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectorField {
    /// Element wrapping one reply in the feed.
    ReplyContainer,
    /// Author handle inside a reply.
    Author,
    /// Reply text inside a reply.
    Body,
}

impl SelectorField {
    pub const ALL: [SelectorField; 3] = [
        SelectorField::ReplyContainer,
        SelectorField::Author,
        SelectorField::Body,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SelectorField::ReplyContainer => "reply_container",
            SelectorField::Author => "author",
            SelectorField::Body => "body",
        }
    }
}

impl fmt::Display for SelectorField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for SelectorField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "reply_container" | "container" => Ok(SelectorField::ReplyContainer),
            "author" | "username" => Ok(SelectorField::Author),
            "body" | "content" => Ok(SelectorField::Body),
            other => Err(format!(
                "unknown selector '{}', expected reply_container, author or body",
                other
            )),
        }
    }
}

/// Persisted selector values; `None` means not derived yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorSet {
    #[serde(default)]
    pub reply_container: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

impl SelectorSet {
    pub fn get(&self, field: SelectorField) -> Option<&str> {
        match field {
            SelectorField::ReplyContainer => self.reply_container.as_deref(),
            SelectorField::Author => self.author.as_deref(),
            SelectorField::Body => self.body.as_deref(),
        }
    }

    pub fn set(&mut self, field: SelectorField, value: Option<String>) {
        let slot = match field {
            SelectorField::ReplyContainer => &mut self.reply_container,
            SelectorField::Author => &mut self.author,
            SelectorField::Body => &mut self.body,
        };
        *slot = value;
    }

    /// Check that every selector has a value.
    pub fn is_complete(&self) -> bool {
        SelectorField::ALL.iter().all(|f| self.get(*f).is_some())
    }
}
