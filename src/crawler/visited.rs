use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::trace;

/// Every URL ever claimed during one crawl.
///
/// URLs are compared as exact strings: `http://a.test` and `http://a.test/`
/// are two different entries.
#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `url` for crawling. Returns true only for the first caller;
    /// the membership check and the insert happen under one lock.
    pub fn try_claim(&self, url: &str) -> bool {
        let mut urls = self.lock();
        if urls.contains(url) {
            trace!("Skipping already claimed URL: {}", url);
            return false;
        }
        urls.insert(url.to_string())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.lock().contains(url)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // The set stays consistent even if a holder panicked: insert is the only
    // mutation.
    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.urls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
