pub mod http;

use async_trait::async_trait;
use std::time::Duration;

use crate::error::FetchError;

pub use http::HttpFetcher;

/// Retrieves the raw body of a page. One call is one attempt; callers do
/// not retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, FetchError>;
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory site: URL to page body, with everything else answering 404
    #[derive(Default)]
    pub struct StaticFetcher {
        pages: HashMap<String, Vec<u8>>,
        timeouts: Vec<String>,
        calls: Mutex<Vec<String>>,
    }

    impl StaticFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn page(mut self, url: &str, body: &str) -> Self {
            self.pages.insert(url.to_string(), body.as_bytes().to_vec());
            self
        }

        pub fn raw_page(mut self, url: &str, body: &[u8]) -> Self {
            self.pages.insert(url.to_string(), body.to_vec());
            self
        }

        pub fn timeout(mut self, url: &str) -> Self {
            self.timeouts.push(url.to_string());
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Fetcher for StaticFetcher {
        async fn fetch(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, FetchError> {
            self.calls.lock().unwrap().push(url.to_string());
            tokio::task::yield_now().await;

            if self.timeouts.iter().any(|t| t == url) {
                return Err(FetchError::Timeout {
                    url: url.to_string(),
                    timeout,
                });
            }

            self.pages.get(url).cloned().ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }
}
