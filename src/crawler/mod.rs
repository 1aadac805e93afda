pub mod controller;
pub mod frontier;
pub mod progress;
pub mod task;
pub mod visited;
pub mod worker;

// Re-export common types
pub use controller::Crawler;
pub use task::CrawlSummary;
