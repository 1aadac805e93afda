pub mod commands;
pub mod config;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use config::CrawlSettings;

/// Crawl a site breadth-first and store every page in SQLite
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Seed URL to start crawling from
    #[arg(short = 'u', long = "url")]
    pub url: Option<String>,

    /// Maximum crawl depth, the seed being depth 1 [default: 2]
    #[arg(short = 'd', long = "depth")]
    pub depth: Option<u32>,

    /// Log file name [default: spider.log]
    #[arg(short = 'f', long = "logfile")]
    pub log_file: Option<PathBuf>,

    /// Log verbosity, 1 (least) to 5 (most) [default: 5]
    #[arg(short = 'l', long = "loglevel", value_name = "1-5")]
    pub log_level: Option<u8>,

    /// Number of concurrent workers [default: 10]
    #[arg(long = "thread", value_name = "THREAD_NUMBER")]
    pub threads: Option<usize>,

    /// SQLite database file [default: spider.db]
    #[arg(long = "dbfile", value_name = "DATABASE_FILE")]
    pub db_file: Option<PathBuf>,

    /// Only store pages containing this keyword
    #[arg(long = "key", value_name = "KEYWORD")]
    pub key: Option<String>,

    /// YAML settings profile; explicit flags override it
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Print the final summary as JSON
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Resolve the settings profile and apply flag overrides on top
    pub fn settings(&self) -> Result<CrawlSettings> {
        let mut settings = match &self.config {
            Some(path) => CrawlSettings::load_from_file(path)?,
            None => CrawlSettings::default(),
        };

        if let Some(depth) = self.depth {
            settings.max_depth = depth;
        }
        if let Some(log_file) = &self.log_file {
            settings.log_file = log_file.clone();
        }
        if let Some(level) = self.log_level {
            settings.log_level = level;
        }
        if let Some(threads) = self.threads {
            settings.workers = threads;
        }
        if let Some(db_file) = &self.db_file {
            settings.store_path = db_file.clone();
        }
        if let Some(key) = &self.key {
            settings.keyword = Some(key.clone());
        }

        Ok(settings)
    }
}

/// Parse command line arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Process the command
pub async fn process_command(cli: Cli) -> Result<()> {
    let settings = cli.settings()?;
    commands::crawl(cli.url.as_deref(), settings, cli.json).await
}
