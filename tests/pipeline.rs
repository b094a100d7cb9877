//! End-to-end pipeline tests against an in-memory reply feed.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use stopthecount::llm::{EntityExtractor, LlmError};
use stopthecount::scrapers::{BrowserLauncher, PageDriver, ScrollOptions};
use stopthecount::selectors::SelectorField;
use stopthecount::services::{ReplyService, ReplySource};
use stopthecount::ScrapeError;
use tempfile::tempdir;

const URL: &str = "https://x.com/StopTheCountBot/status/1731861672199909757";

fn cell(author: &str, body: &str) -> String {
    format!(
        r#"<div class="user"><span>{author}</span></div><div class="text"><span>{body}</span></div>"#
    )
}

/// A feed that grows once per scroll until its script runs out.
struct FeedPage {
    extents: VecDeque<u64>,
    rounds: VecDeque<Vec<String>>,
    last: Vec<String>,
}

#[async_trait]
impl PageDriver for FeedPage {
    async fn navigate(&mut self, _url: &str) -> stopthecount::Result<()> {
        Ok(())
    }

    async fn scroll_extent(&mut self) -> stopthecount::Result<u64> {
        if self.extents.len() > 1 {
            Ok(self.extents.pop_front().unwrap_or_default())
        } else {
            Ok(self.extents.front().copied().unwrap_or_default())
        }
    }

    async fn scroll_to_bottom(&mut self) -> stopthecount::Result<()> {
        Ok(())
    }

    async fn wait_for_presence(
        &mut self,
        _selector: &str,
        _timeout: Duration,
    ) -> stopthecount::Result<bool> {
        Ok(true)
    }

    async fn capture(&mut self, _selector: &str) -> stopthecount::Result<Vec<String>> {
        if let Some(round) = self.rounds.pop_front() {
            self.last = round;
        }
        Ok(self.last.clone())
    }

    async fn close(&mut self) -> stopthecount::Result<()> {
        Ok(())
    }
}

struct FeedLauncher {
    extents: Vec<u64>,
    rounds: Vec<Vec<String>>,
    launches: AtomicUsize,
}

impl FeedLauncher {
    fn new(extents: &[u64], rounds: Vec<Vec<String>>) -> Self {
        Self {
            extents: extents.to_vec(),
            rounds,
            launches: AtomicUsize::new(0),
        }
    }

    fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowserLauncher for FeedLauncher {
    type Driver = FeedPage;

    async fn launch(&self) -> stopthecount::Result<FeedPage> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        Ok(FeedPage {
            extents: self.extents.iter().copied().collect(),
            rounds: self.rounds.iter().cloned().collect(),
            last: Vec::new(),
        })
    }
}

/// Answers from a fixed table keyed by reply text.
struct TableExtractor;

#[async_trait]
impl EntityExtractor for TableExtractor {
    async fn extract(&self, _subject: &str, text: &str) -> Result<String, LlmError> {
        match text {
            "Jane Doe for finance" => Ok("Jane Doe".to_string()),
            "Jane Doe and John Roe" => Ok("Jane Doe|John Roe".to_string()),
            "timeout please" => Err(LlmError::Connection("timed out".to_string())),
            _ => Ok("None".to_string()),
        }
    }
}

fn instant() -> ScrollOptions {
    ScrollOptions {
        wait_timeout: Duration::from_millis(10),
        settle_delay: Duration::ZERO,
        max_rounds: 20,
    }
}

fn feed() -> FeedLauncher {
    let post = cell("@StopTheCountBot", "Who should be minister?");
    let first = vec![
        post.clone(),
        cell("@alice", "Jane Doe for finance"),
        cell("@bob", "lol"),
    ];
    let second = vec![
        cell("@bob", "lol"),
        cell("@carol", "Jane Doe and John Roe"),
        cell("@dave", "timeout please"),
    ];
    FeedLauncher::new(&[1000, 2000, 3000, 3000], vec![first, second])
}

fn service(dir: &std::path::Path, launcher: FeedLauncher) -> ReplyService<FeedLauncher> {
    let mut service = ReplyService::in_dir(launcher, dir).with_options(instant());
    let store = service.store_mut();
    store.set(SelectorField::ReplyContainer, "div[data-testid=\"cellInnerDiv\"]");
    store.set(SelectorField::Author, "div[class=\"user\"] > span");
    store.set(SelectorField::Body, "div[class=\"text\"] > span");
    service
}

#[tokio::test]
async fn test_scrape_extract_and_cache() {
    let dir = tempdir().unwrap();
    let service = service(dir.path(), feed());

    let thread = service.replies(URL, false).await.unwrap();
    assert_eq!(thread.source, ReplySource::Scraped);
    assert_eq!(thread.replies.len(), 4);
    assert_eq!(thread.replies.get("@alice"), Some("Jane Doe for finance"));
    assert_eq!(thread.replies.get("@bob"), Some("lol"));
    assert!(thread.replies.get("@StopTheCountBot").is_none());
    assert!(service.cache().raw_path(&thread.key).exists());

    let cached = service.replies(URL, false).await.unwrap();
    assert_eq!(cached.source, ReplySource::Cache);
    assert_eq!(cached.replies, thread.replies);
    assert_eq!(service.launcher().launches(), 1);
}

#[tokio::test]
async fn test_refresh_scrapes_again() {
    let dir = tempdir().unwrap();
    let service = service(dir.path(), feed());

    service.replies(URL, false).await.unwrap();
    let fresh = service.replies(URL, true).await.unwrap();
    assert_eq!(fresh.source, ReplySource::Scraped);
    assert_eq!(service.launcher().launches(), 2);
}

#[tokio::test]
async fn test_proposals_end_to_end() {
    let dir = tempdir().unwrap();
    let service = service(dir.path(), feed());

    let result = service
        .proposals(&TableExtractor, URL, "ministers", false)
        .await
        .unwrap();

    assert_eq!(result.thread.replies.len(), 4);
    assert_eq!(result.proposals.len(), 2);
    assert_eq!(result.proposals.get("@alice"), Some("Jane Doe"));
    assert_eq!(result.proposals.names("@carol"), vec!["Jane Doe", "John Roe"]);
    assert!(result.proposals.get("@bob").is_none());
    assert!(result.proposals.get("@dave").is_none());

    let tally = result.proposals.tally();
    assert_eq!(tally["Jane Doe"].len(), 2);

    let saved = service.cache().proposals_path(&result.thread.key);
    assert!(saved.exists());
    let on_disk: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(saved).unwrap()).unwrap();
    assert_eq!(on_disk["@alice"], "Jane Doe");
}

#[tokio::test]
async fn test_invalid_url_never_launches() {
    let dir = tempdir().unwrap();
    let service = service(dir.path(), feed());

    let err = service
        .replies("https://example.com/someone/status/1", false)
        .await
        .unwrap_err();
    assert!(matches!(err, ScrapeError::InvalidUrl(_)));
    assert_eq!(service.launcher().launches(), 0);
}
