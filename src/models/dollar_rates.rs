// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

pub const CURRENCY: &str = "USD";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateKind {
    Official,
    Parallel,
}

impl RateKind {
    pub const ALL: [RateKind; 2] = [RateKind::Official, RateKind::Parallel];

    /// Value of the `nombre` field
    pub fn label(&self) -> &'static str {
        match self {
            RateKind::Official => "Oficial",
            RateKind::Parallel => "Paralelo",
        }
    }

    /// File name under `v1/dolares/`
    pub fn slug(&self) -> &'static str {
        match self {
            RateKind::Official => "oficial",
            RateKind::Parallel => "paralelo",
        }
    }
}

/// One rate record, serialized with DolarAPI-compatible keys.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DollarRate {
    #[serde(rename = "moneda")]
    pub currency: String,
    #[serde(rename = "nombre")]
    pub label: String,
    /// `null` when the source could not be fetched
    #[serde(rename = "promedio")]
    pub average_rate: Option<f64>,
    #[serde(rename = "fechaActualizacion")]
    pub timestamp: String,
}

impl DollarRate {
    pub fn new(kind: RateKind, average_rate: Option<f64>, timestamp: &str) -> Self {
        Self {
            currency: CURRENCY.to_string(),
            label: kind.label().to_string(),
            average_rate,
            timestamp: timestamp.to_string(),
        }
    }
}

/// Result of one run: both rates taken at the same instant
#[derive(Debug, Clone, PartialEq)]
pub struct RatesSnapshot {
    pub official: Option<f64>,
    pub parallel: Option<f64>,
    pub taken_at: NaiveDateTime,
}

impl RatesSnapshot {
    pub fn new(official: Option<f64>, parallel: Option<f64>) -> Self {
        Self {
            official,
            parallel,
            taken_at: Local::now().naive_local(),
        }
    }

    pub fn rate(&self, kind: RateKind) -> Option<f64> {
        match kind {
            RateKind::Official => self.official,
            RateKind::Parallel => self.parallel,
        }
    }

    pub fn record(&self, kind: RateKind) -> DollarRate {
        DollarRate::new(kind, self.rate(kind), &iso_timestamp(self.taken_at))
    }

    /// `[official, parallel]`, sharing one timestamp
    pub fn records(&self) -> Vec<DollarRate> {
        RateKind::ALL.iter().map(|kind| self.record(*kind)).collect()
    }
}

/// Local time as `YYYY-MM-DDTHH:MM:SS[.ffffff]`, without offset. The fraction is
/// dropped when the microsecond part is zero.
pub fn iso_timestamp(dt: NaiveDateTime) -> String {
    if dt.nanosecond() / 1_000 == 0 {
        dt.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}
