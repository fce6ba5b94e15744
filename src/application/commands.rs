//! CLI commands and handlers
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::application::arbitrage_monitor::ArbitrageMonitor;
use crate::application::fetch_coordinator::FetchMode;
use crate::config::{format_pairs_list, Config};
use crate::infrastructure::default_registry;

#[derive(Parser, Debug)]
#[command(name = "arbmon")]
#[command(version, about = "Cross-exchange spot arbitrage monitor for centralized crypto exchanges")]
pub struct Cli {
    /// Path to config file (optional)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: ConfigOverrides,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags that take priority over the config file
#[derive(Args, Debug, Default)]
pub struct ConfigOverrides {
    /// Exchanges to query (comma-separated: binance,bybit,gateio,htx,mexc)
    #[arg(long, global = true, value_delimiter = ',')]
    pub exchanges: Option<Vec<String>>,

    /// Pairs to scan (comma-separated, e.g. BTCUSDT,ETHUSDT)
    #[arg(long, global = true, value_delimiter = ',', conflicts_with = "pairs_file")]
    pub pairs: Option<Vec<String>>,

    /// File with one pair per line
    #[arg(long, global = true)]
    pub pairs_file: Option<PathBuf>,

    /// Minimum spread in percent
    #[arg(long, global = true)]
    pub min_spread: Option<f64>,

    /// Minimum 24h quote volume per exchange
    #[arg(long, global = true)]
    pub min_volume: Option<f64>,

    /// Minimum number of liquid exchanges quoting a pair
    #[arg(long, global = true)]
    pub min_exchanges: Option<usize>,

    /// Fetch one ticker per exchange and pair instead of bulk tickers
    #[arg(long, global = true)]
    pub per_pair: bool,
}

impl ConfigOverrides {
    pub fn apply(&self, config: &mut Config) {
        if let Some(exchanges) = &self.exchanges {
            config.scanner.exchanges = exchanges.clone();
        }
        if let Some(pairs) = &self.pairs {
            config.scanner.pairs = pairs.clone();
            config.scanner.pairs_file = None;
        }
        if let Some(path) = &self.pairs_file {
            config.scanner.pairs_file = Some(path.clone());
        }
        if let Some(min_spread) = self.min_spread {
            config.thresholds.min_spread_pct = min_spread;
        }
        if let Some(min_volume) = self.min_volume {
            config.thresholds.min_quote_volume = min_volume;
        }
        if let Some(min_exchanges) = self.min_exchanges {
            config.thresholds.min_exchange_count = min_exchanges;
        }
        if self.per_pair {
            config.scanner.fetch_mode = FetchMode::PerPair;
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one detection cycle and print the result
    Scan {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Poll on the configured interval until Ctrl-C
    Watch {
        /// Print reports as JSON
        #[arg(long)]
        json: bool,
    },

    /// List pairs quoted on at least N of the selected exchanges
    Discover {
        /// Minimum number of exchanges listing a pair
        #[arg(long, default_value_t = 3)]
        min_coverage: usize,

        /// Write the list to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

pub struct CommandExecutor;

impl CommandExecutor {
    /// Execute the selected command
    pub async fn execute(command: Commands, config: Config) -> Result<()> {
        let settings = config.monitor_settings().context("invalid configuration")?;
        let registry = default_registry(settings.coordinator.per_request_timeout)?;
        let monitor = Arc::new(ArbitrageMonitor::new(&registry, settings)?);

        match command {
            Commands::Scan { json } => Self::execute_scan_command(&monitor, json).await,
            Commands::Watch { json } => Self::execute_watch_command(&monitor, json).await,
            Commands::Discover { min_coverage, output } => {
                Self::execute_discover_command(&monitor, min_coverage, output).await
            }
        }
    }

    async fn execute_scan_command(monitor: &ArbitrageMonitor, json: bool) -> Result<()> {
        let report = monitor.refresh().await;
        if json {
            println!("{}", report.to_json()?);
        } else {
            print!("{}", report.render_table());
        }
        Ok(())
    }

    async fn execute_watch_command(monitor: &Arc<ArbitrageMonitor>, json: bool) -> Result<()> {
        info!("👀 Watching {} pairs, Ctrl-C to stop", monitor.settings().pairs.len());
        let handle = monitor.spawn_polling();
        let mut reports = handle.reports();

        loop {
            tokio::select! {
                changed = reports.changed() => {
                    if changed.is_err() {
                        warn!("⚠️ Polling task exited");
                        break;
                    }
                    let latest = reports.borrow_and_update().clone();
                    if let Some(report) = latest {
                        if json {
                            println!("{}", report.to_json()?);
                        } else {
                            print!("{}", report.render_table());
                        }
                    }
                }
                signal = tokio::signal::ctrl_c() => {
                    signal.context("listen for Ctrl-C")?;
                    info!("Ctrl-C received, stopping");
                    break;
                }
            }
        }

        handle.stop().await;
        Ok(())
    }

    async fn execute_discover_command(
        monitor: &ArbitrageMonitor,
        min_coverage: usize,
        output: Option<PathBuf>,
    ) -> Result<()> {
        let pairs = monitor.discover(min_coverage).await;
        let header = format!(
            "Pairs listed on at least {} exchanges\nGenerated {}\nTotal: {}",
            min_coverage,
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
            pairs.len()
        );
        let text = format_pairs_list(&pairs, &header);

        match output {
            Some(path) => {
                fs::write(&path, text).with_context(|| format!("write {}", path.display()))?;
                info!("💾 Saved {} pairs to {}", pairs.len(), path.display());
            }
            None => print!("{}", text),
        }
        Ok(())
    }
}
