// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::{Context, Result};

/// Parse a number that may use a decimal comma, e.g. `" 36,58610000 "`.
pub fn parse_decimal(text: &str) -> Result<f64> {
    let normalized = text.trim().replace(',', ".");
    normalized
        .parse::<f64>()
        .with_context(|| format!("Not a number: {:?}", text.trim()))
}

/// Format a rate as a float literal, keeping the `.0` on whole numbers
pub fn format_rate(rate: f64) -> String {
    serde_json::Value::from(rate).to_string()
}

/// Render an optional rate the way the summary line shows it
pub fn display_rate(rate: Option<f64>) -> String {
    match rate {
        Some(rate) => format_rate(rate),
        None => "None".to_string(),
    }
}
