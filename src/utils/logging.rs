use anyhow::Result;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Map the 1-5 verbosity scale onto tracing levels. 1 and 2 both map to
/// ERROR since tracing has no level above it.
pub fn level_filter(verbosity: u8) -> LevelFilter {
    match verbosity {
        0..=2 => LevelFilter::ERROR,
        3 => LevelFilter::WARN,
        4 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    }
}

/// Initialize the logging system.
///
/// Everything at `verbosity` or above goes to `log_file`, which is truncated
/// on every run. The console only shows warnings unless `RUST_LOG` says
/// otherwise.
pub fn init_logging(verbosity: u8, log_file: &Path) -> Result<()> {
    if let Some(parent) = log_file.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file = fs::File::create(log_file)?;
    let file_layer = fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .with_writer(Arc::new(file))
        .with_filter(level_filter(verbosity));

    let console_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(console_filter);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_mapping() {
        assert_eq!(level_filter(1), LevelFilter::ERROR);
        assert_eq!(level_filter(2), LevelFilter::ERROR);
        assert_eq!(level_filter(3), LevelFilter::WARN);
        assert_eq!(level_filter(4), LevelFilter::INFO);
        assert_eq!(level_filter(5), LevelFilter::DEBUG);
    }
}
