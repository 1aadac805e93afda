pub mod pages;

// Re-export common types
pub use pages::{PageRecord, PageStore};
