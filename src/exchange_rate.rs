//! Exchange-rate payload as served by openexchangerates `latest.json`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A snapshot of exchange rates relative to one base currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRateList {
    /// ISO 4217 code of the base currency.
    #[serde(rename = "base")]
    pub base_currency: String,

    /// Unix timestamp (seconds) the rates were published at.
    #[serde(default)]
    pub timestamp: u64,

    /// Units of each currency per one unit of the base.
    pub rates: BTreeMap<String, f64>,
}

impl ExchangeRateList {
    /// Rate for `code`, if present.
    pub fn rate(&self, code: &str) -> Option<f64> {
        self.rates.get(code).copied()
    }

    /// Convert `amount` between two currencies through the base.
    pub fn convert(&self, amount: f64, from: &str, to: &str) -> Option<f64> {
        let from_rate = if from == self.base_currency {
            1.0
        } else {
            self.rate(from)?
        };
        let to_rate = if to == self.base_currency {
            1.0
        } else {
            self.rate(to)?
        };
        if from_rate == 0.0 {
            return None;
        }
        Some(amount / from_rate * to_rate)
    }
}

impl std::fmt::Display for ExchangeRateList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ExchangeRateList (BaseCurrency: {}, Rates: {})",
            self.base_currency,
            self.rates.len()
        )
    }
}
