// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::RateSource;
use crate::config::BinanceConfig;
use crate::utils::parse_decimal;

/// Reads the parallel rate from the Binance P2P advertisement search.
pub struct BinanceP2PClient {
    client: Client,
    url: String,
    request: AdSearchRequest,
    rank: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdSearchRequest {
    pub asset: String,
    pub fiat: String,
    pub merchant_check: bool,
    pub page: u32,
    pub pay_types: Vec<String>,
    pub publisher_type: Option<String>,
    pub rows: u32,
    pub trade_type: String,
}

impl AdSearchRequest {
    pub fn from_config(config: &BinanceConfig) -> Self {
        Self {
            asset: config.asset.clone(),
            fiat: config.fiat.clone(),
            merchant_check: false,
            page: 1,
            pay_types: Vec::new(),
            publisher_type: None,
            rows: config.rows,
            trade_type: config.trade_type.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AdSearchResponse {
    #[serde(default)]
    pub data: Option<Vec<AdItem>>,
}

#[derive(Debug, Deserialize)]
pub struct AdItem {
    #[serde(default)]
    pub adv: Option<Adv>,
    #[serde(default)]
    pub advertiser: Option<Advertiser>,
}

#[derive(Debug, Deserialize)]
pub struct Adv {
    pub price: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Advertiser {
    #[serde(default)]
    pub is_promoted: Option<bool>,
}

impl AdItem {
    pub fn is_promoted(&self) -> bool {
        self.advertiser
            .as_ref()
            .and_then(|a| a.is_promoted)
            .unwrap_or(false)
    }
}

impl BinanceP2PClient {
    pub fn new(config: &BinanceConfig, timeout: Duration) -> Result<Self> {
        let mut builder = Client::builder().timeout(timeout);
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build().context("Failed to create Binance HTTP client")?;

        Ok(Self {
            client,
            url: config.url.clone(),
            request: AdSearchRequest::from_config(config),
            rank: config.rank,
        })
    }
}

#[async_trait::async_trait]
impl RateSource for BinanceP2PClient {
    fn name(&self) -> &'static str {
        "Binance"
    }

    async fn fetch_rate(&self) -> Result<f64> {
        debug!("POST {} {:?}", self.url, self.request);
        let response = self
            .client
            .post(&self.url)
            .json(&self.request)
            .send()
            .await
            .context("Failed to send request to Binance P2P")?;

        let status = response.status();
        let text = response.text().await.context("Failed to get response text")?;

        if !status.is_success() {
            bail!("Binance P2P request failed with status: {}", status);
        }

        let search: AdSearchResponse =
            serde_json::from_str(&text).context("Failed to parse Binance P2P response")?;

        select_price(&search.data.unwrap_or_default(), self.rank)
    }
}

/// Price of the `rank`-th organic (non-promoted) ad, 1-based. Falls back to the
/// first organic ad when there are fewer than `rank` of them.
pub fn select_price(ads: &[AdItem], rank: usize) -> Result<f64> {
    let organic: Vec<&AdItem> = ads.iter().filter(|ad| !ad.is_promoted()).collect();

    let ad = organic
        .get(rank.saturating_sub(1))
        .or_else(|| organic.first())
        .context("No organic P2P ads returned")?;

    let adv = ad.adv.as_ref().context("Selected P2P ad has no adv object")?;
    parse_decimal(&adv.price)
}
