use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::settings::Fiat;

/// Price and 24h change of one asset in one currency.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PriceQuote {
    pub price: Option<f64>,
    pub change_24h: Option<f64>,
}

/// Raw bulk price response: asset id → { "eur": 30000, "eur_24h_change": 2.5, ... }.
///
/// Kept in wire shape so one response can serve several currencies
/// (the exchange-rate derivation asks for two at once). Missing ids, missing
/// keys and `null` values all read back as `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceTable {
    pub entries: HashMap<String, HashMap<String, Option<f64>>>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a quote for `id` in `fiat`.
    pub fn insert(&mut self, id: &str, fiat: Fiat, price: f64, change_24h: Option<f64>) {
        let entry = self.entries.entry(id.to_string()).or_default();
        entry.insert(fiat.code().to_string(), Some(price));
        if let Some(change) = change_24h {
            entry.insert(format!("{}_24h_change", fiat.code()), Some(change));
        }
    }

    /// Price of `id` in `fiat`, if the response carried one.
    pub fn price(&self, id: &str, fiat: Fiat) -> Option<f64> {
        self.field(id, fiat.code())
    }

    /// 24h change of `id` in `fiat`, if the response carried one.
    pub fn change_24h(&self, id: &str, fiat: Fiat) -> Option<f64> {
        self.field(id, &format!("{}_24h_change", fiat.code()))
    }

    pub fn quote(&self, id: &str, fiat: Fiat) -> PriceQuote {
        PriceQuote {
            price: self.price(id, fiat),
            change_24h: self.change_24h(id, fiat),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn field(&self, id: &str, key: &str) -> Option<f64> {
        self.entries
            .get(id)?
            .get(key)
            .copied()
            .flatten()
            .filter(|v| v.is_finite())
    }
}
