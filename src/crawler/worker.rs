use scraper::Html;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::frontier::{Frontier, Slot};
use super::task::{FrontierItem, PageOutcome};
use super::visited::VisitedSet;
use crate::cli::config::CrawlConfig;
use crate::fetch::Fetcher;
use crate::parse;
use crate::storage::PageStore;
use crate::utils::CrawlMetrics;

/// Shared flag asking workers to stop fetching
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything a worker shares with the rest of the run
#[derive(Clone)]
pub struct CrawlContext {
    pub config: Arc<CrawlConfig>,
    pub frontier: Arc<Frontier>,
    pub visited: Arc<VisitedSet>,
    pub store: Arc<PageStore>,
    pub fetcher: Arc<dyn Fetcher>,
    pub metrics: Arc<CrawlMetrics>,
    pub cancel: CancelHandle,
}

/// One member of the worker pool
pub struct Worker {
    id: usize,
    ctx: CrawlContext,
}

impl Worker {
    pub fn new(id: usize, ctx: CrawlContext) -> Self {
        Self { id, ctx }
    }

    /// Process items until a sentinel arrives. Returns how many items this
    /// worker marked done.
    pub async fn run(self) -> usize {
        debug!("Worker {} started", self.id);
        let mut processed = 0;

        loop {
            let item = match self.ctx.frontier.take().await {
                Slot::Sentinel => break,
                Slot::Item(item) => item,
            };

            // Marks the item done however processing below ends
            let _done = self.ctx.frontier.done_guard();
            processed += 1;

            if self.ctx.cancel.is_cancelled() {
                debug!("Cancelled, dropping {}", item.url);
                continue;
            }

            let outcome = self.process(&item).await;
            debug!(url = %item.url, depth = item.depth, ?outcome, "Task done");
        }

        debug!("Worker {} stopped after {} items", self.id, processed);
        processed
    }

    /// Fetch, filter, store, then expand one page
    async fn process(&self, item: &FrontierItem) -> PageOutcome {
        let ctx = &self.ctx;
        info!("Crawling [depth {}]: {}", item.depth, item.url);

        let body = match ctx.fetcher.fetch(&item.url, ctx.config.fetch_timeout).await {
            Ok(body) => body,
            Err(e) => {
                warn!("Failed to fetch {}: {}", item.url, e);
                ctx.metrics.record_fetch_failure();
                return PageOutcome::FetchFailed;
            }
        };
        ctx.metrics.record_fetched();

        let text = match parse::decode_page(&item.url, &body) {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to parse {}: {}", item.url, e);
                ctx.metrics.record_parse_failure();
                return PageOutcome::ParseFailed;
            }
        };

        // The parsed document is not Send, so it must be gone before the next await
        let (links, wanted) = {
            let document = Html::parse_document(&text);
            let wanted = match &ctx.config.keyword {
                Some(keyword) => parse::contains_keyword(&document, keyword),
                None => true,
            };
            (parse::extract_links(&document), wanted)
        };

        let outcome = if wanted {
            match ctx.store.upsert(&item.url, &body).await {
                Ok(()) => {
                    ctx.metrics.record_persisted();
                    PageOutcome::Stored
                }
                Err(e) => {
                    error!("{}", e);
                    ctx.metrics.record_store_failure();
                    PageOutcome::StoreFailed
                }
            }
        } else {
            debug!("Keyword not found, not storing {}", item.url);
            ctx.metrics.record_filtered_out();
            PageOutcome::FilteredOut
        };

        // The keyword only decides storage; links are followed either way
        self.expand(item, links);

        outcome
    }

    /// Queue the unclaimed links of `parent`, unless it sits at max depth
    fn expand(&self, parent: &FrontierItem, links: HashSet<String>) {
        if parent.depth >= self.ctx.config.max_depth {
            return;
        }

        let found = links.len();
        let mut queued = 0;
        for link in links {
            if self.ctx.visited.try_claim(&link) {
                self.ctx.frontier.submit(parent.child(link));
                queued += 1;
            }
        }

        debug!("{}: {} links, {} new", parent.url, found, queued);
    }
}
