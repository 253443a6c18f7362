use anyhow::Result;
use clap::Parser;
use tracing::error;

use foldersync::config::Cli;
use foldersync::{driver, logging};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging first so setup failures land in the log file too.
    let _guard = logging::init(&cli.log_file, cli.verbose)?;

    let config = match cli.into_config() {
        Ok(config) => config,
        Err(err) => {
            error!("Invalid configuration: {:#}", err);
            return Err(err);
        }
    };

    driver::run(config.driver, config.sync).await
}
