use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use arbmon::application::{Cli, CommandExecutor};
use arbmon::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();

    // Priority: CLI args > Config file > Defaults
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    cli.overrides.apply(&mut config);

    CommandExecutor::execute(cli.command, config).await
}
