use anyhow::Result;

mod cli;
mod crawler;
mod error;
mod fetch;
mod parse;
mod storage;
mod utils;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = cli::parse_args();

    // Logging is configured by the command itself, once the log file and
    // verbosity are known.
    if let Err(e) = cli::process_command(args).await {
        tracing::error!("Command failed: {:#}", e);
        return Err(e);
    }

    Ok(())
}
