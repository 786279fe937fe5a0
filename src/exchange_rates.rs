// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::{Context, Result};
use csv::Writer;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

use crate::api::{BcvClient, BinanceP2PClient, RateSource};
use crate::config::Config;
use crate::models::{RateKind, RatesSnapshot};
use crate::utils::{display_rate, format_rate};

const INDEX_FILE: &str = "index.json";
const RATES_DIR: &str = "v1/dolares";

/// Fetch a rate, logging and swallowing any failure
pub async fn fetch_or_none(source: &dyn RateSource) -> Option<f64> {
    match source.fetch_rate().await {
        Ok(rate) => {
            info!("{} rate fetched: {}", source.name(), rate);
            Some(rate)
        }
        Err(e) => {
            error!("Error fetching {}: {:#}", source.name(), e);
            None
        }
    }
}

/// Fetch both rates one after the other. A failing source yields `None`.
pub async fn fetch_rates(official: &dyn RateSource, parallel: &dyn RateSource) -> RatesSnapshot {
    let official_rate = fetch_or_none(official).await;
    let parallel_rate = fetch_or_none(parallel).await;
    RatesSnapshot::new(official_rate, parallel_rate)
}

/// Serialize as pretty JSON with 4-space indentation
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut buf = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value
        .serialize(&mut serializer)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;
    fs::write(path, buf).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Write `index.json` and the per-rate files under `v1/dolares/`, overwriting
/// whatever a previous run left there.
pub fn write_rates(snapshot: &RatesSnapshot, output_dir: &Path) -> Result<Vec<PathBuf>> {
    let rates_dir = output_dir.join(RATES_DIR);
    fs::create_dir_all(&rates_dir)
        .with_context(|| format!("Failed to create {}", rates_dir.display()))?;

    let mut written = Vec::new();

    let index_path = output_dir.join(INDEX_FILE);
    write_json(&index_path, &snapshot.records())?;
    written.push(index_path);

    for kind in RateKind::ALL {
        let path = rates_dir.join(kind.slug());
        write_json(&path, &snapshot.record(kind))?;
        written.push(path);
    }

    Ok(written)
}

/// Export the snapshot to `output/rates_<timestamp>.csv` below `output_dir`
pub fn export_rates_csv(snapshot: &RatesSnapshot, output_dir: &Path) -> Result<PathBuf> {
    let csv_dir = output_dir.join("output");
    fs::create_dir_all(&csv_dir)
        .with_context(|| format!("Failed to create {}", csv_dir.display()))?;

    let timestamp = snapshot.taken_at.format("%Y%m%d_%H%M%S");
    let csv_path = csv_dir.join(format!("rates_{}.csv", timestamp));
    let mut writer = Writer::from_path(&csv_path)?;

    writer.write_record(["Moneda", "Nombre", "Promedio", "Fecha Actualizacion"])?;

    for record in snapshot.records() {
        let rate = record.average_rate.map(format_rate).unwrap_or_default();
        writer.write_record([
            record.currency.as_str(),
            record.label.as_str(),
            rate.as_str(),
            record.timestamp.as_str(),
        ])?;
    }

    writer.flush()?;
    Ok(csv_path)
}

/// Fetch both rates, write the JSON files and optionally a CSV export
pub async fn run_update(config: &Config, csv: bool) -> Result<RatesSnapshot> {
    let timeout = Duration::from_secs(config.timeout_secs);
    let bcv = BcvClient::new(&config.bcv, timeout)?;
    let binance = BinanceP2PClient::new(&config.binance, timeout)?;

    println!("Fetching current exchange rates...");
    let snapshot = fetch_rates(&bcv, &binance).await;

    let written = write_rates(&snapshot, &config.output_dir)?;
    for path in &written {
        println!("✅ Written {}", path.display());
    }

    if csv {
        let csv_path = export_rates_csv(&snapshot, &config.output_dir)?;
        println!("✅ Exchange rates written to {}", csv_path.display());
    }

    println!(
        "Rates updated: BCV={}, Binance={}",
        display_rate(snapshot.official),
        display_rate(snapshot.parallel)
    );

    Ok(snapshot)
}
