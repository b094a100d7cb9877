//! Reply thread service.
//!
//! Ties together URL parsing, the local cache, the scroller, extraction and
//! selector repair. Separated from UI concerns so the CLI only renders.

use std::path::Path;

use tracing::{info, warn};

use crate::config::Settings;
use crate::error::Result;
use crate::llm::{extract_proposals, EntityExtractor};
use crate::models::{PostKey, ProposalResult, ScrapeResult};
use crate::scrapers::{
    extract_replies, fetch_fragments, BrowserLauncher, ReplyFilters, ReplySelectors, ScrollOptions,
};
use crate::selectors::repair::repair_selectors;
use crate::selectors::{ReferencePost, RepairedSelectors, SelectorField, SelectorStore};
use crate::storage::ReplyCache;

/// Where a thread's replies came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Cache,
    Scraped,
}

/// Replies of one post.
#[derive(Debug, Clone)]
pub struct ThreadReplies {
    pub key: PostKey,
    pub replies: ScrapeResult,
    pub source: ReplySource,
}

/// Replies of one post with the proposals extracted from them.
#[derive(Debug, Clone)]
pub struct ThreadProposals {
    pub thread: ThreadReplies,
    pub proposals: ProposalResult,
}

/// Service for scraping reply threads and repairing selectors.
pub struct ReplyService<L> {
    launcher: L,
    store: SelectorStore,
    cache: ReplyCache,
    options: ScrollOptions,
    filters: ReplyFilters,
    reference: ReferencePost,
}

impl<L: BrowserLauncher> ReplyService<L> {
    /// Create a service whose selectors and cache live under `settings.data_dir`.
    pub fn new(launcher: L, settings: &Settings) -> Self {
        Self::in_dir(launcher, &settings.data_dir)
            .with_options(settings.browser.scroll_options())
            .with_filters(settings.filters.clone())
            .with_reference(settings.reference.clone())
    }

    /// Create a service with default options rooted at `data_dir`.
    pub fn in_dir(launcher: L, data_dir: &Path) -> Self {
        Self {
            launcher,
            store: SelectorStore::in_dir(data_dir),
            cache: ReplyCache::new(data_dir),
            options: ScrollOptions::default(),
            filters: ReplyFilters::default(),
            reference: ReferencePost::default(),
        }
    }

    pub fn with_options(mut self, options: ScrollOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_filters(mut self, filters: ReplyFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_reference(mut self, reference: ReferencePost) -> Self {
        self.reference = reference;
        self
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    pub fn store(&self) -> &SelectorStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SelectorStore {
        &mut self.store
    }

    pub fn cache(&self) -> &ReplyCache {
        &self.cache
    }

    /// Replies of the post at `url`, from the cache unless `refresh` is set.
    ///
    /// The URL is validated before any I/O. Fresh results are cached; a
    /// failed cache write is logged and the replies are still returned.
    pub async fn replies(&self, url: &str, refresh: bool) -> Result<ThreadReplies> {
        let key = PostKey::parse(url)?;

        if !refresh {
            if let Some(replies) = self.cache.load(&key) {
                return Ok(ThreadReplies {
                    key,
                    replies,
                    source: ReplySource::Cache,
                });
            }
        }

        let replies = self.scrape(&key).await?;
        self.cache.save(&key, &replies);

        Ok(ThreadReplies {
            key,
            replies,
            source: ReplySource::Scraped,
        })
    }

    async fn scrape(&self, key: &PostKey) -> Result<ScrapeResult> {
        // Fail on unset selectors before launching a browser.
        let container = self.store.require(SelectorField::ReplyContainer)?;
        let selectors = ReplySelectors::compile(self.store.selectors())?;

        info!("Scraping replies of {}", key);
        let captured = fetch_fragments(&self.launcher, &key.url, container, &self.options).await?;
        let (post, fragments) = captured.into_post_and_replies();
        if post.is_none() {
            warn!("No post captured for {}", key);
        }

        Ok(extract_replies(&fragments, &selectors, &self.filters))
    }

    /// Replies of the post at `url` with the proposals about `subject`.
    /// Proposals are saved next to the cached replies.
    pub async fn proposals<E>(
        &self,
        extractor: &E,
        url: &str,
        subject: &str,
        refresh: bool,
    ) -> Result<ThreadProposals>
    where
        E: EntityExtractor + ?Sized,
    {
        let thread = self.replies(url, refresh).await?;
        let proposals = extract_proposals(extractor, subject, &thread.replies).await;
        self.cache.save_proposals(&thread.key, &proposals);
        Ok(ThreadProposals { thread, proposals })
    }

    /// Re-derive every selector from the reference post.
    pub async fn repair(&mut self, container_class: &str) -> Result<RepairedSelectors> {
        repair_selectors(
            &self.launcher,
            &mut self.store,
            container_class,
            &self.reference,
            &self.options,
        )
        .await
    }
}
