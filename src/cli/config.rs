use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::ConfigError;

/// Settings profile, loadable from YAML. Every field has a default so a
/// profile only needs to name what it changes.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CrawlSettings {
    pub max_depth: u32,
    pub workers: usize,
    pub keyword: Option<String>,
    pub store_path: PathBuf,
    pub log_file: PathBuf,
    pub log_level: u8,
    pub fetch: FetchSettings,
    pub progress: ProgressSettings,
}

/// HTTP fetch settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct FetchSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
}

/// Progress report timing
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ProgressSettings {
    pub initial_delay_secs: u64,
    pub interval_secs: u64,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            max_depth: 2,
            workers: 10,
            keyword: None,
            store_path: PathBuf::from("spider.db"),
            log_file: PathBuf::from("spider.log"),
            log_level: 5,
            fetch: FetchSettings::default(),
            progress: ProgressSettings::default(),
        }
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: concat!("spider/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            initial_delay_secs: 1,
            interval_secs: 10,
        }
    }
}

impl CrawlSettings {
    /// Load a settings profile from a YAML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        debug!("Loading configuration from: {}", path.display());
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Reject values the logging layer cannot map
    pub fn validate_log_level(&self) -> Result<u8, ConfigError> {
        match self.log_level {
            1..=5 => Ok(self.log_level),
            other => Err(ConfigError::LogLevel(other)),
        }
    }
}

/// Validated, immutable configuration of one crawl run
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub seed_url: String,
    pub max_depth: u32,
    pub worker_count: usize,
    pub keyword: Option<String>,
    pub store_path: PathBuf,
    pub fetch_timeout: Duration,
    pub user_agent: String,
    pub progress_delay: Duration,
    pub progress_interval: Duration,
}

impl CrawlConfig {
    /// Build the run configuration from a seed and a settings profile.
    ///
    /// A seed without an `http` prefix gets `http://` prepended. The seed is
    /// otherwise kept verbatim, since visited-URL identity is exact string
    /// identity.
    pub fn new(seed: Option<&str>, settings: &CrawlSettings) -> Result<Self, ConfigError> {
        let seed = seed.map(str::trim).filter(|s| !s.is_empty()).ok_or(ConfigError::MissingSeed)?;
        let seed_url = if seed.starts_with("http") {
            seed.to_string()
        } else {
            format!("http://{}", seed)
        };

        Url::parse(&seed_url).map_err(|source| ConfigError::InvalidSeed {
            url: seed_url.clone(),
            source,
        })?;

        if settings.max_depth == 0 {
            return Err(ConfigError::ZeroDepth);
        }
        if settings.workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }

        Ok(Self {
            seed_url,
            max_depth: settings.max_depth,
            worker_count: settings.workers,
            keyword: settings.keyword.clone().filter(|k| !k.is_empty()),
            store_path: settings.store_path.clone(),
            fetch_timeout: Duration::from_secs(settings.fetch.timeout_secs),
            user_agent: settings.fetch.user_agent.clone(),
            progress_delay: Duration::from_secs(settings.progress.initial_delay_secs),
            progress_interval: Duration::from_secs(settings.progress.interval_secs.max(1)),
        })
    }
}
