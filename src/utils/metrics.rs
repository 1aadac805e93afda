use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Per-run page outcome counters shared by all workers
#[derive(Debug, Default)]
pub struct CrawlMetrics {
    fetched: AtomicUsize,
    fetch_failures: AtomicUsize,
    parse_failures: AtomicUsize,
    persisted: AtomicUsize,
    store_failures: AtomicUsize,
    filtered_out: AtomicUsize,
}

/// Point-in-time copy of [`CrawlMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub fetched: usize,
    pub fetch_failures: usize,
    pub parse_failures: usize,
    pub persisted: usize,
    pub store_failures: usize,
    pub filtered_out: usize,
}

impl CrawlMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_fetched(&self) {
        self.fetched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_parse_failure(&self) {
        self.parse_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_persisted(&self) {
        self.persisted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_store_failure(&self) {
        self.store_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_filtered_out(&self) {
        self.filtered_out.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            fetched: self.fetched.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            parse_failures: self.parse_failures.load(Ordering::Relaxed),
            persisted: self.persisted.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
            filtered_out: self.filtered_out.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_counters_across_tasks() {
        let metrics = Arc::new(CrawlMetrics::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let metrics = metrics.clone();
                tokio::spawn(async move {
                    for _ in 0..100 {
                        metrics.record_fetched();
                        metrics.record_persisted();
                    }
                    metrics.record_fetch_failure();
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.fetched, 800);
        assert_eq!(snapshot.persisted, 800);
        assert_eq!(snapshot.fetch_failures, 8);
        assert_eq!(snapshot.store_failures, 0);
    }
}
