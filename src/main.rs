// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

mod api;
mod config;
mod exchange_rates;
mod models;
#[cfg(test)]
mod test_server;
mod utils;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use crate::api::{BcvClient, BinanceP2PClient, RateSource};

#[derive(Parser)]
#[command(author, version, about = "Fetch the official and parallel USD/VES rates", long_about = None)]
struct Cli {
    /// Path to a config.toml (defaults to ./config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory that receives index.json and v1/dolares/
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch both rates and write the JSON files (default)
    Update {
        /// Also export the rates to output/rates_<timestamp>.csv
        #[arg(long)]
        csv: bool,
    },
    /// Fetch and print the BCV official rate only
    Official,
    /// Fetch and print the Binance P2P rate only
    Parallel,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn print_rate(source: &dyn RateSource) -> Result<()> {
    let rate = source
        .fetch_rate()
        .await
        .with_context(|| format!("Failed to fetch {} rate", source.name()))?;
    println!("{}={}", source.name(), utils::format_rate(rate));
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let config = config::resolve_config(cli.config.as_deref(), cli.output_dir)?;

    let timeout = Duration::from_secs(config.timeout_secs);

    match cli.command.unwrap_or(Commands::Update { csv: false }) {
        Commands::Update { csv } => {
            exchange_rates::run_update(&config, csv).await?;
        }
        Commands::Official => {
            let client = BcvClient::new(&config.bcv, timeout)?;
            print_rate(&client).await?;
        }
        Commands::Parallel => {
            let client = BinanceP2PClient::new(&config.binance, timeout)?;
            print_rate(&client).await?;
        }
    }

    Ok(())
}
