//! Reply extraction from captured container fragments.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, ScrapeError};
use crate::models::{ReplyRecord, ScrapeResult};
use crate::selectors::{SelectorField, SelectorSet};

/// Optional checks applied to each extracted reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyFilters {
    /// Drop replies whose body spans more lines than this.
    #[serde(default)]
    pub max_body_lines: Option<usize>,
    /// Drop replies repeating the same line.
    #[serde(default)]
    pub reject_repeated_lines: bool,
}

impl ReplyFilters {
    fn rejects(&self, record: &ReplyRecord) -> Option<&'static str> {
        if let Some(limit) = self.max_body_lines {
            if !record.within_line_limit(limit) {
                return Some("too many lines");
            }
        }
        if self.reject_repeated_lines && record.has_repeated_lines() {
            return Some("repeated lines");
        }
        None
    }
}

/// Author and body selectors parsed and ready to run against fragments.
#[derive(Debug, Clone)]
pub struct ReplySelectors {
    author: Selector,
    body: Selector,
}

impl ReplySelectors {
    /// Compile the author and body selectors; unset or invalid ones are an error.
    pub fn compile(selectors: &SelectorSet) -> Result<Self> {
        Ok(Self {
            author: compile_field(selectors, SelectorField::Author)?,
            body: compile_field(selectors, SelectorField::Body)?,
        })
    }
}

fn compile_field(selectors: &SelectorSet, field: SelectorField) -> Result<Selector> {
    let css = selectors
        .get(field)
        .ok_or(ScrapeError::SelectorUnset(field))?;
    Selector::parse(css).map_err(|e| ScrapeError::InvalidSelector {
        field,
        selector: css.to_string(),
        reason: e.to_string(),
    })
}

/// Text content of an element with surrounding whitespace removed.
fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Extract one reply from a container fragment.
///
/// Returns `None` when the author or body selector matches nothing.
pub fn extract_reply(fragment: &str, selectors: &ReplySelectors) -> Option<ReplyRecord> {
    let document = Html::parse_document(fragment);
    let author = document.select(&selectors.author).next().map(element_text)?;
    let body = document.select(&selectors.body).next().map(element_text)?;
    Some(ReplyRecord { author, body })
}

/// Extract every reply, skipping fragments that do not yield a record.
///
/// An author appearing twice keeps the last reply.
pub fn extract_replies<I, S>(
    fragments: I,
    selectors: &ReplySelectors,
    filters: &ReplyFilters,
) -> ScrapeResult
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut result = ScrapeResult::default();
    let mut skipped = 0usize;

    for (index, fragment) in fragments.into_iter().enumerate() {
        let Some(record) = extract_reply(fragment.as_ref(), selectors) else {
            warn!(
                "Failed to extract author/body from reply fragment #{}",
                index
            );
            skipped += 1;
            continue;
        };

        if let Some(reason) = filters.rejects(&record) {
            warn!("Dropping reply from {}: {}", record.author, reason);
            skipped += 1;
            continue;
        }

        if let Some(previous) = result.push(record) {
            tracing::debug!("Replaced earlier reply: {:?}", previous);
        }
    }

    info!("Extracted {} replies ({} skipped)", result.len(), skipped);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selectors() -> ReplySelectors {
        ReplySelectors::compile(&SelectorSet {
            reply_container: Some("div[class=\"cell\"]".to_string()),
            author: Some("div[class=\"user\"] > span".to_string()),
            body: Some("div[class=\"text\"] > span".to_string()),
        })
        .unwrap()
    }

    fn fragment(author: &str, body: &str) -> String {
        format!(
            r#"<div class="user"><span>{author}</span></div>
               <div class="text"><span>{body}</span></div>"#
        )
    }

    #[test]
    fn test_extracts_first_match() {
        let html = format!(
            "{}{}",
            fragment("@alice", "Jean Dupont"),
            fragment("@quoted", "ignored")
        );
        let record = extract_reply(&html, &selectors()).unwrap();
        assert_eq!(record, ReplyRecord::new("@alice", "Jean Dupont"));
    }

    #[test]
    fn test_missing_author_is_skipped_not_fatal() {
        let fragments = vec![
            fragment("@alice", "Jean Dupont"),
            r#"<div class="text"><span>promoted content</span></div>"#.to_string(),
            fragment("@bob", "Marie Curie"),
        ];
        let result = extract_replies(&fragments, &selectors(), &ReplyFilters::default());

        assert_eq!(result.len(), 2);
        assert_eq!(result.get("@alice"), Some("Jean Dupont"));
        assert_eq!(result.get("@bob"), Some("Marie Curie"));
    }

    #[test]
    fn test_same_author_last_wins() {
        let fragments = vec![fragment("@alice", "first"), fragment("@alice", "second")];
        let result = extract_replies(&fragments, &selectors(), &ReplyFilters::default());
        assert_eq!(result.get("@alice"), Some("second"));
    }

    #[test]
    fn test_filters_drop_replies() {
        let fragments = vec![
            fragment("@alice", "Jean Dupont"),
            r#"<div class="user"><span>@spam</span></div>
               <div class="text"><span>vote
vote</span></div>"#
                .to_string(),
        ];
        let filters = ReplyFilters {
            max_body_lines: None,
            reject_repeated_lines: true,
        };
        let result = extract_replies(&fragments, &selectors(), &filters);
        assert_eq!(result.len(), 1);
        assert!(result.get("@spam").is_none());
    }

    #[test]
    fn test_unset_selector_refuses_to_compile() {
        let set = SelectorSet {
            author: Some("span".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            ReplySelectors::compile(&set),
            Err(ScrapeError::SelectorUnset(SelectorField::Body))
        ));
    }

    #[test]
    fn test_invalid_selector_names_field() {
        let set = SelectorSet {
            reply_container: None,
            author: Some("div[".to_string()),
            body: Some("span".to_string()),
        };
        match ReplySelectors::compile(&set) {
            Err(ScrapeError::InvalidSelector { field, selector, .. }) => {
                assert_eq!(field, SelectorField::Author);
                assert_eq!(selector, "div[");
            }
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }
}
