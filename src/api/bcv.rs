// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::{anyhow, bail, Context, Result};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::debug;

use super::RateSource;
use crate::config::BcvConfig;
use crate::utils::parse_decimal;

/// Scrapes the official USD rate from the Banco Central de Venezuela homepage.
pub struct BcvClient {
    client: Client,
    url: String,
}

impl BcvClient {
    pub fn new(config: &BcvConfig, timeout: Duration) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs);
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build().context("Failed to create BCV HTTP client")?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }
}

#[async_trait::async_trait]
impl RateSource for BcvClient {
    fn name(&self) -> &'static str {
        "BCV"
    }

    async fn fetch_rate(&self) -> Result<f64> {
        debug!("GET {}", self.url);
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .context("Failed to send request to BCV")?;

        let status = response.status();
        let text = response.text().await.context("Failed to get response text")?;

        if !status.is_success() {
            bail!("BCV request failed with status: {}", status);
        }

        parse_bcv_rate(&text)
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("Invalid selector {}: {:?}", css, e))
}

fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>()
}

/// Extract the USD rate from the BCV homepage markup.
///
/// The rate normally sits in the first `<strong>` of `<div id="dolar">`. If that
/// container is missing, the first `<strong>` following a `div.field-content`
/// mentioning `USD` is used instead.
pub fn parse_bcv_rate(html: &str) -> Result<f64> {
    let document = Html::parse_document(html);

    let dolar = selector("div#dolar")?;
    let strong = selector("strong")?;
    if let Some(container) = document.select(&dolar).next() {
        if let Some(rate) = container.select(&strong).next() {
            return parse_decimal(&element_text(rate));
        }
    }

    debug!("No rate in div#dolar, scanning field-content blocks");

    // Tree order, so a <strong> after a matching container is its find-next
    let fallback = selector("div.field-content, strong")?;
    let mut usd_seen = false;
    for element in document.select(&fallback) {
        if element.value().name() == "strong" {
            if usd_seen {
                return parse_decimal(&element_text(element));
            }
        } else if element_text(element).contains("USD") {
            usd_seen = true;
        }
    }

    bail!("USD rate not found in BCV page")
}
