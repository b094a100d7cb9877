//! Incremental page scrolling for infinite-scroll reply feeds.

use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::driver::{BrowserLauncher, PageDriver};
use crate::error::{Result, ScrapeError};

/// Parameters of the scroll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollOptions {
    /// How long to wait for a reply container after each scroll.
    pub wait_timeout: Duration,
    /// Pause after the containers appear, for lazy rendering.
    pub settle_delay: Duration,
    /// Safety valve for pages whose height never settles.
    pub max_rounds: usize,
}

impl Default for ScrollOptions {
    fn default() -> Self {
        Self {
            wait_timeout: Duration::from_secs(10),
            settle_delay: Duration::from_secs(2),
            max_rounds: 200,
        }
    }
}

/// Fragments captured from one page, first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedPage {
    fragments: Vec<String>,
    seen: HashSet<String>,
    rounds: usize,
}

impl CapturedPage {
    /// Add a fragment unless an identical one was captured before.
    pub fn add(&mut self, fragment: String) -> bool {
        if self.seen.contains(&fragment) {
            return false;
        }
        self.seen.insert(fragment.clone());
        self.fragments.push(fragment);
        true
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Number of capture rounds the scroll loop ran.
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Split off the first fragment, which is the post itself.
    pub fn into_post_and_replies(self) -> (Option<String>, Vec<String>) {
        let mut fragments = self.fragments.into_iter();
        let post = fragments.next();
        (post, fragments.collect())
    }
}

/// Scroll `url` until its height stops changing, capturing every distinct
/// element matching `container_selector`.
pub async fn scroll_page<D>(
    driver: &mut D,
    url: &str,
    container_selector: &str,
    options: &ScrollOptions,
) -> Result<CapturedPage>
where
    D: PageDriver + ?Sized,
{
    info!("Scrolling {}", url);
    driver.navigate(url).await?;

    let mut captured = CapturedPage::default();
    let mut last_extent = driver.scroll_extent().await?;

    loop {
        if captured.rounds >= options.max_rounds {
            return Err(ScrapeError::ScrollLimit {
                url: url.to_string(),
                rounds: captured.rounds,
            });
        }

        driver.scroll_to_bottom().await?;

        if !driver
            .wait_for_presence(container_selector, options.wait_timeout)
            .await?
        {
            return Err(ScrapeError::StaleSelector {
                url: url.to_string(),
                selector: container_selector.to_string(),
                timeout: options.wait_timeout,
            });
        }

        if !options.settle_delay.is_zero() {
            tokio::time::sleep(options.settle_delay).await;
        }

        let mut added = 0;
        for fragment in driver.capture(container_selector).await? {
            if captured.add(fragment) {
                added += 1;
            }
        }
        captured.rounds += 1;

        let extent = driver.scroll_extent().await?;
        debug!(
            "Round {}: {} new fragments, extent {} -> {}",
            captured.rounds, added, last_extent, extent
        );
        if extent == last_extent {
            info!(
                "Reached end of {} after {} rounds ({} fragments)",
                url,
                captured.rounds,
                captured.len()
            );
            break;
        }
        last_extent = extent;
    }

    Ok(captured)
}

/// Launch a browser session, scroll `url`, and close the session whatever
/// the outcome.
pub async fn fetch_fragments<L>(
    launcher: &L,
    url: &str,
    container_selector: &str,
    options: &ScrollOptions,
) -> Result<CapturedPage>
where
    L: BrowserLauncher + ?Sized,
{
    let mut driver = launcher.launch().await?;
    let outcome = scroll_page(&mut driver, url, container_selector, options).await;

    match driver.close().await {
        Ok(()) => debug!("Browser closed"),
        Err(e) => warn!("Failed to close browser session: {}", e),
    }

    outcome
}


#[cfg(test)]
mod tests {
    use super::testing::{instant, ScriptedLauncher, ScriptedPage};
    use super::*;

    const URL: &str = "https://x.com/someone/status/1";
    const CONTAINER: &str = "div[class=\"cell\"]";

    #[tokio::test]
    async fn test_stops_when_extent_settles() {
        let mut page = ScriptedPage::new(
            &[100, 250, 250],
            vec![vec!["post", "a"], vec!["b"], vec!["never"]],
        );
        let captured = scroll_page(&mut page, URL, CONTAINER, &instant())
            .await
            .unwrap();

        assert_eq!(captured.rounds(), 2);
        assert_eq!(page.log.captures(), 2);
        assert_eq!(captured.fragments(), ["post", "a", "b"]);
    }

    #[tokio::test]
    async fn test_duplicate_fragments_are_kept_once() {
        let mut page = ScriptedPage::new(
            &[100, 200, 300, 300],
            vec![vec!["post", "a"], vec!["a", "b"], vec!["b", "a", "c"]],
        );
        let captured = scroll_page(&mut page, URL, CONTAINER, &instant())
            .await
            .unwrap();

        assert_eq!(captured.fragments(), ["post", "a", "b", "c"]);
        let (post, replies) = captured.into_post_and_replies();
        assert_eq!(post.as_deref(), Some("post"));
        assert_eq!(replies, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_missing_container_is_stale_selector() {
        let mut page = ScriptedPage::new(&[100], vec![]);
        page.container_present = false;

        let err = scroll_page(&mut page, URL, CONTAINER, &instant())
            .await
            .unwrap_err();
        match err {
            ScrapeError::StaleSelector { url, selector, .. } => {
                assert_eq!(url, URL);
                assert_eq!(selector, CONTAINER);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(page.log.captures(), 0);
    }

    #[tokio::test]
    async fn test_ever_growing_page_hits_round_limit() {
        let extents: Vec<u64> = (1..=100).map(|i| i * 100).collect();
        let mut page = ScriptedPage::new(&extents, vec![]);
        let options = ScrollOptions {
            max_rounds: 5,
            ..instant()
        };

        let err = scroll_page(&mut page, URL, CONTAINER, &options)
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::ScrollLimit { rounds: 5, .. }));
        assert_eq!(page.log.captures(), 5);
    }

    #[tokio::test]
    async fn test_session_closed_on_success_and_failure() {
        let ok = ScriptedPage::new(&[10, 10], vec![vec!["post"]]);
        let mut stale = ScriptedPage::new(&[10], vec![]);
        stale.container_present = false;
        let growing = ScriptedPage::new(&[10, 20, 30, 40, 50], vec![]);
        let launcher = ScriptedLauncher::new(vec![ok, stale, growing]);

        assert!(fetch_fragments(&launcher, URL, CONTAINER, &instant())
            .await
            .is_ok());

        let err = fetch_fragments(&launcher, URL, CONTAINER, &instant())
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::StaleSelector { .. }));

        let limited = ScrollOptions {
            max_rounds: 2,
            ..instant()
        };
        let err = fetch_fragments(&launcher, URL, CONTAINER, &limited)
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::ScrollLimit { rounds: 2, .. }));

        assert_eq!(launcher.log.launches(), 3);
        assert_eq!(launcher.log.closes(), 3);
    }
}
