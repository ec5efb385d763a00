use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

use super::asset::{AssetCandidate, AssetDetail};
use super::color::seed_pastel;
use super::price::PriceQuote;

/// One position in one asset: what the user owns plus cached market data.
///
/// `amount` and `avg_cost` belong to the user. Everything from `price` down
/// is written only by the price sync service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    /// Stable API identifier, unique within a portfolio (e.g., "bitcoin")
    pub id: String,

    /// Ticker symbol, uppercased (e.g., "BTC")
    pub symbol: String,

    /// Display name (e.g., "Bitcoin")
    pub name: String,

    /// Units held
    pub amount: f64,

    /// Average cost per unit, in the reference currency
    #[serde(default)]
    pub avg_cost: f64,

    /// Last known price per unit, in the reference currency
    #[serde(default)]
    pub price: f64,

    /// price × amount as of the last sync
    #[serde(default)]
    pub value: f64,

    #[serde(default, rename = "change24h")]
    pub change_24h: f64,

    #[serde(default, rename = "change7d")]
    pub change_7d: f64,

    /// 7-day price series, oldest first
    #[serde(default, rename = "spark7d")]
    pub spark_7d: Vec<f64>,

    /// CSS color for the pie chart slice
    #[serde(default)]
    pub color: String,

    /// Icon URL (may be empty)
    #[serde(default)]
    pub icon: String,

    /// When icon / series / 7d change were last refreshed from the detail endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_refreshed_at: Option<DateTime<Utc>>,
}

impl Holding {
    /// New holding with no market data yet. Color is derived from the id.
    pub fn new(candidate: &AssetCandidate, amount: f64, avg_cost: f64) -> Self {
        Self {
            id: candidate.id.clone(),
            symbol: candidate.symbol.to_uppercase(),
            name: candidate.name.clone(),
            amount,
            avg_cost,
            price: 0.0,
            value: 0.0,
            change_24h: 0.0,
            change_7d: 0.0,
            spark_7d: Vec::new(),
            color: seed_pastel(&candidate.id),
            icon: String::new(),
            detail_refreshed_at: None,
        }
    }

    /// Check user-owned fields: positive amount, non-negative cost.
    pub fn validate_position(amount: f64, avg_cost: f64) -> Result<(), CoreError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(CoreError::ValidationError(
                "Amount must be a positive number".into(),
            ));
        }
        if !avg_cost.is_finite() || avg_cost < 0.0 {
            return Err(CoreError::ValidationError(
                "Average cost must be zero or a positive number".into(),
            ));
        }
        Ok(())
    }

    /// Current market value: price × amount.
    pub fn market_value(&self) -> f64 {
        self.price * self.amount
    }

    /// Cost basis of the whole position: avg_cost × amount.
    pub fn invested(&self) -> f64 {
        self.avg_cost * self.amount
    }

    pub fn profit_loss(&self) -> f64 {
        self.market_value() - self.invested()
    }

    /// Merge a bulk price quote. Missing price keeps the previous one;
    /// missing change keeps the previous change.
    pub fn apply_quote(&mut self, quote: &PriceQuote) {
        if let Some(price) = quote.price {
            self.price = price;
        }
        self.value = self.market_value();
        if let Some(change) = quote.change_24h {
            self.change_24h = change;
        }
    }

    /// Merge detail data. Empty strings / series never blank out known values.
    pub fn apply_detail(&mut self, detail: &AssetDetail, now: DateTime<Utc>) {
        if !detail.icon.is_empty() {
            self.icon = detail.icon.clone();
        }
        if !detail.spark.is_empty() {
            self.spark_7d = detail.spark.clone();
        }
        if let Some(change) = detail.change_7d {
            self.change_7d = change;
        }
        if !detail.color.is_empty() {
            self.color = detail.color.clone();
        } else if self.color.is_empty() {
            self.color = seed_pastel(&self.id);
        }
        self.detail_refreshed_at = Some(now);
    }

    /// A holding needs its detail refreshed when it has no series, was never
    /// refreshed, or was last refreshed at least `max_age` ago.
    pub fn needs_detail_refresh(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        if self.spark_7d.is_empty() {
            return true;
        }
        match self.detail_refreshed_at {
            None => true,
            Some(at) => now - at >= max_age,
        }
    }

    /// Direction of the 7-day series: `None` with fewer than two points.
    pub fn spark_trend(&self) -> Option<SparkTrend> {
        if self.spark_7d.len() < 2 {
            return None;
        }
        let first = self.spark_7d[0];
        let last = self.spark_7d[self.spark_7d.len() - 1];
        Some(if last >= first {
            SparkTrend::Up
        } else {
            SparkTrend::Down
        })
    }
}

/// Color direction of a sparkline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SparkTrend {
    Up,
    Down,
}

impl std::fmt::Display for SparkTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SparkTrend::Up => write!(f, "up"),
            SparkTrend::Down => write!(f, "down"),
        }
    }
}
