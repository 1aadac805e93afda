use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::config::{CrawlConfig, CrawlSettings};
use crate::crawler::{CrawlSummary, Crawler};
use crate::utils::init_logging;

/// Run one crawl from `seed` and print its summary
pub async fn crawl(seed: Option<&str>, settings: CrawlSettings, json: bool) -> Result<()> {
    let level = settings.validate_log_level()?;
    init_logging(level, &settings.log_file)
        .context(format!("Failed to initialize logging to {}", settings.log_file.display()))?;

    info!("Starting spider v{}", env!("CARGO_PKG_VERSION"));

    let config = CrawlConfig::new(seed, &settings)?;
    info!(
        "Seed: {}, max depth: {}, workers: {}",
        config.seed_url, config.max_depth, config.worker_count
    );

    let crawler = Crawler::new(config)
        .await
        .context("Failed to set up the crawler")?;

    let cancel = crawler.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, draining the remaining queue without fetching");
            cancel.cancel();
        }
    });

    let summary = crawler.run().await;
    print_summary(&summary, json)?;

    Ok(())
}

fn print_summary(summary: &CrawlSummary, json: bool) -> Result<()> {
    if json {
        let output = serde_json::to_string_pretty(summary).context("Failed to serialize summary")?;
        println!("{}", output);
    } else {
        println!(
            "Crawled {} urls ({} stored, {} failed), 0 urls waiting",
            summary.completed,
            summary.persisted,
            summary.fetch_failures + summary.parse_failures
        );
    }
    Ok(())
}
