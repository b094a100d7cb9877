//! Selector self-repair.
//!
//! When the site reshuffles its class names, the author and body selectors
//! are re-derived from a reference post whose content is known: the element
//! holding a known text anchor is located and its ancestry is turned back
//! into a selector.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{LocationPath, PathStep, SelectorField, SelectorStore};
use crate::error::{Result, ScrapeError};
use crate::scrapers::{fetch_fragments, BrowserLauncher, ScrollOptions};

/// A post whose content is known, used as the repair reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferencePost {
    /// Status URL of the reference post.
    #[serde(default = "default_reference_url")]
    pub url: String,
    /// Exact author handle text shown on the post.
    #[serde(default = "default_author_anchor")]
    pub author_anchor: String,
    /// Exact body text shown on the post.
    #[serde(default = "default_body_anchor")]
    pub body_anchor: String,
}

fn default_reference_url() -> String {
    "https://x.com/StopTheCountBot/status/1731861672199909757".to_string()
}

fn default_author_anchor() -> String {
    "@StopTheCountBot".to_string()
}

fn default_body_anchor() -> String {
    "Typical answer model".to_string()
}

impl Default for ReferencePost {
    fn default() -> Self {
        Self {
            url: default_reference_url(),
            author_anchor: default_author_anchor(),
            body_anchor: default_body_anchor(),
        }
    }
}

/// The full selector set produced by a repair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairedSelectors {
    pub reply_container: LocationPath,
    pub author: LocationPath,
    pub body: LocationPath,
}

impl RepairedSelectors {
    /// Write all three selectors to the store.
    pub fn apply(&self, store: &mut SelectorStore) {
        store.set(SelectorField::ReplyContainer, self.reply_container.to_css());
        store.set(SelectorField::Author, self.author.to_css());
        store.set(SelectorField::Body, self.body.to_css());
    }
}

/// Container selector for a reply cell identified by its class attribute.
pub fn container_path(container_class: &str) -> LocationPath {
    LocationPath::class_of("div", container_class.trim())
}

fn step_for(element: &ElementRef<'_>) -> PathStep {
    let value = element.value();
    PathStep::from_attributes(value.name(), value.attr("class"), value.attr("id"))
}

/// Whether one of the element's own text nodes reads exactly `anchor`
/// (ignoring surrounding whitespace).
fn holds_anchor(element: &ElementRef<'_>, anchor: &str) -> bool {
    element
        .children()
        .filter_map(|child| child.value().as_text().map(|text| text.trim() == anchor))
        .any(|matched| matched)
}

/// Derive the selector of the first element holding `anchor` in `fragment`.
pub fn derive_selector(fragment: &str, anchor: &str) -> Result<LocationPath> {
    let document = Html::parse_document(fragment);

    let target = document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|element| holds_anchor(element, anchor))
        .ok_or_else(|| ScrapeError::AnchorMissing {
            anchor: anchor.to_string(),
        })?;

    let mut upwards = vec![step_for(&target)];
    upwards.extend(
        target
            .ancestors()
            .filter_map(ElementRef::wrap)
            .map(|element| step_for(&element)),
    );

    let path = LocationPath::from_target_upwards(upwards);
    check_first_match(&document, &path, anchor);
    Ok(path)
}

/// Extraction takes the first match; warn when that is not the anchor's element.
fn check_first_match(document: &Html, path: &LocationPath, anchor: &str) {
    let Ok(selector) = Selector::parse(&path.to_css()) else {
        warn!("Derived selector does not parse: {}", path);
        return;
    };
    let first_text = document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>());
    if first_text.as_deref().map(str::trim) != Some(anchor) {
        warn!(
            "Derived selector {} first matches {:?}, not {:?}",
            path, first_text, anchor
        );
    }
}

/// Derive author and body selectors from the reference post's fragment.
pub fn derive_from_reference(
    fragment: &str,
    reference: &ReferencePost,
    container_class: &str,
) -> Result<RepairedSelectors> {
    Ok(RepairedSelectors {
        reply_container: container_path(container_class),
        author: derive_selector(fragment, &reference.author_anchor)?,
        body: derive_selector(fragment, &reference.body_anchor)?,
    })
}

/// Re-derive all selectors from the live reference post and persist them.
///
/// `container_class` is the class attribute of a reply cell, read off the
/// live site by hand. Nothing is written unless every selector was derived.
pub async fn repair_selectors<L>(
    launcher: &L,
    store: &mut SelectorStore,
    container_class: &str,
    reference: &ReferencePost,
    options: &ScrollOptions,
) -> Result<RepairedSelectors>
where
    L: BrowserLauncher + ?Sized,
{
    let container = container_path(container_class).to_css();
    info!(
        "Repairing selectors from {} with container {}",
        reference.url, container
    );

    // A stale container here means the supplied class is wrong, not the stored one.
    let captured = fetch_fragments(launcher, &reference.url, &container, options)
        .await
        .map_err(|e| match e {
            ScrapeError::StaleSelector { .. } => ScrapeError::ContainerNotFound {
                class: container_class.trim().to_string(),
                url: reference.url.clone(),
            },
            other => other,
        })?;
    let (post, _) = captured.into_post_and_replies();
    let post = post.ok_or_else(|| ScrapeError::ReferenceEmpty {
        url: reference.url.clone(),
    })?;

    let repaired = derive_from_reference(&post, reference, container_class)?;
    repaired.apply(store);

    info!(
        "Selectors repaired: author={} body={}",
        repaired.author, repaired.body
    );
    Ok(repaired)
}
