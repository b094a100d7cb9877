//! Error types for scraping, extraction and selector repair.

use std::time::Duration;

use thiserror::Error;

use crate::selectors::SelectorField;

/// Errors raised while scraping a reply thread.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("URL does not match https://x.com/<username>/status/<id>: {0}")]
    InvalidUrl(String),

    #[error(
        "No element matched {selector} on {url} within {timeout:?}; \
         the reply container selector is stale, run `stc repair`"
    )]
    StaleSelector {
        url: String,
        selector: String,
        timeout: Duration,
    },

    #[error("Page {url} kept growing after {rounds} scroll rounds")]
    ScrollLimit { url: String, rounds: usize },

    #[error("Selector '{0}' is not set, run `stc repair` first")]
    SelectorUnset(SelectorField),

    #[error("Selector '{field}' is not a valid CSS selector ({selector}): {reason}")]
    InvalidSelector {
        field: SelectorField,
        selector: String,
        reason: String,
    },

    #[error("Reference anchor {anchor:?} not found; the reference post needs updating")]
    AnchorMissing { anchor: String },

    #[error(
        "Container class {class:?} matched nothing on reference post {url}; \
         check the reply container class on the live site"
    )]
    ContainerNotFound { class: String, url: String },

    #[error("Reference post {url} returned no fragments")]
    ReferenceEmpty { url: String },

    #[error("Browser error: {0}")]
    Browser(String),
}

pub type Result<T, E = ScrapeError> = std::result::Result<T, E>;
