use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::MetricsSnapshot;

/// A discovered URL waiting to be crawled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontierItem {
    /// URL to crawl
    pub url: String,

    /// Hops from the seed, the seed itself being depth 1
    pub depth: u32,
}

impl FrontierItem {
    pub fn seed(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            depth: 1,
        }
    }

    /// Item for a link found on this page, one hop deeper
    pub fn child(&self, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            depth: self.depth + 1,
        }
    }
}

/// What happened to one item in the worker pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageOutcome {
    Stored,
    FilteredOut,
    StoreFailed,
    FetchFailed,
    ParseFailed,
}

/// Final report of a crawl run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlSummary {
    pub run_id: Uuid,
    pub seed_url: String,

    /// Items taken from the frontier and marked done
    pub completed: usize,

    /// Distinct URLs claimed, including ones whose fetch failed
    pub visited: usize,

    pub persisted: usize,
    pub fetch_failures: usize,
    pub parse_failures: usize,
    pub store_failures: usize,
    pub filtered_out: usize,
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlSummary {
    pub(crate) fn new(
        run_id: Uuid,
        seed_url: String,
        completed: usize,
        visited: usize,
        metrics: MetricsSnapshot,
        cancelled: bool,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            run_id,
            seed_url,
            completed,
            visited,
            persisted: metrics.persisted,
            fetch_failures: metrics.fetch_failures,
            parse_failures: metrics.parse_failures,
            store_failures: metrics.store_failures,
            filtered_out: metrics.filtered_out,
            cancelled,
            started_at,
            finished_at: Utc::now(),
        }
    }
}
