use std::time::Duration;
use thiserror::Error;

/// Failure to retrieve a page over the network
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Fetched content that cannot be treated as a page
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("content of {url} looks binary ({nul_bytes} NUL bytes in the first {window} bytes)")]
    Binary {
        url: String,
        nul_bytes: usize,
        window: usize,
    },
}

/// Failure of the page store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open page store at {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("failed to create the WEBSITE table: {0}")]
    Schema(#[source] sqlx::Error),

    #[error("failed to upsert {url}: {source}")]
    Write {
        url: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("failed to read from page store: {0}")]
    Read(#[source] sqlx::Error),
}

/// Invalid run configuration, always fatal before any worker starts
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("a seed URL is required (-u/--url)")]
    MissingSeed,

    #[error("invalid seed URL '{url}': {source}")]
    InvalidSeed {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("max depth must be at least 1")]
    ZeroDepth,

    #[error("worker count must be at least 1")]
    ZeroWorkers,

    #[error("log level must be between 1 and 5, got {0}")]
    LogLevel(u8),

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}
