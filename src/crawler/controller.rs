use anyhow::{Context, Result};
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

use super::frontier::Frontier;
use super::progress::ProgressReporter;
use super::task::{CrawlSummary, FrontierItem};
use super::visited::VisitedSet;
use super::worker::{CancelHandle, CrawlContext, Worker};
use crate::cli::config::CrawlConfig;
use crate::fetch::{Fetcher, HttpFetcher};
use crate::storage::PageStore;
use crate::utils::CrawlMetrics;

/// One crawl run: owns the frontier, the visited set, the store and the
/// configuration. Build a new one for every run.
pub struct Crawler {
    run_id: Uuid,
    ctx: CrawlContext,
}

impl Crawler {
    /// Create a crawler with the on-disk store and the HTTP fetcher
    pub async fn new(config: CrawlConfig) -> Result<Self> {
        let store = PageStore::open(&config.store_path)
            .await
            .context(format!("Failed to open page store: {}", config.store_path.display()))?;

        let fetcher = HttpFetcher::new(&config.user_agent).context("Failed to create HTTP client")?;

        Ok(Self::with_parts(config, Arc::new(store), Arc::new(fetcher)))
    }

    /// Create a crawler over an explicit store and fetcher
    pub fn with_parts(config: CrawlConfig, store: Arc<PageStore>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            ctx: CrawlContext {
                config: Arc::new(config),
                frontier: Arc::new(Frontier::new()),
                visited: Arc::new(VisitedSet::new()),
                store,
                fetcher,
                metrics: Arc::new(CrawlMetrics::new()),
                cancel: CancelHandle::default(),
            },
        }
    }

    /// Handle that makes workers stop fetching and drain what is left
    pub fn cancel_handle(&self) -> CancelHandle {
        self.ctx.cancel.clone()
    }

    /// Crawl until the frontier drains, then stop the workers and report
    pub async fn run(self) -> CrawlSummary {
        let span = info_span!("crawl", run_id = %self.run_id);
        self.crawl().instrument(span).await
    }

    async fn crawl(self) -> CrawlSummary {
        let started_at = Utc::now();
        let ctx = &self.ctx;
        let config = &ctx.config;

        info!(
            "Crawling {} to depth {} with {} workers",
            config.seed_url, config.max_depth, config.worker_count
        );

        ctx.visited.try_claim(&config.seed_url);
        ctx.frontier.submit(FrontierItem::seed(config.seed_url.clone()));

        let reporter = ProgressReporter::to_console(
            ctx.frontier.clone(),
            config.progress_delay,
            config.progress_interval,
        );

        let workers: Vec<_> = (0..config.worker_count)
            .map(|id| {
                let worker = Worker::new(id, ctx.clone());
                tokio::spawn(worker.run().instrument(info_span!("worker", id)))
            })
            .collect();

        // Every discovered child is submitted before its parent is marked
        // done, so once pending hits zero nothing more can arrive.
        ctx.frontier.wait_drained().await;
        debug!("Frontier drained, stopping {} workers", workers.len());

        for _ in 0..workers.len() {
            ctx.frontier.submit_sentinel();
        }

        for (id, result) in join_all(workers).await.into_iter().enumerate() {
            match result {
                Ok(processed) => debug!("Worker {} processed {} items", id, processed),
                Err(e) => error!("Worker {} exited abnormally: {}", id, e),
            }
        }

        reporter.stop().await;

        match ctx.store.count().await {
            Ok(rows) => info!("Page store now holds {} pages", rows),
            Err(e) => error!("{}", e),
        }

        let summary = CrawlSummary::new(
            self.run_id,
            config.seed_url.clone(),
            ctx.frontier.stats().completed,
            ctx.visited.len(),
            ctx.metrics.snapshot(),
            ctx.cancel.is_cancelled(),
            started_at,
        );

        info!(
            "Crawl finished: {} completed, {} visited, {} stored, {} fetch failures",
            summary.completed, summary.visited, summary.persisted, summary.fetch_failures
        );

        summary
    }
}
