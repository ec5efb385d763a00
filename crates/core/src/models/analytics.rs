use serde::{Deserialize, Serialize};

use super::settings::Fiat;

/// Summary of the whole portfolio, recomputed on every render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioTotals {
    /// Currency used for all monetary values
    pub currency: Fiat,

    /// Number of holdings
    pub holdings: usize,

    /// Σ price × amount
    pub total_value: f64,

    /// Σ avg_cost × amount
    pub total_invested: f64,

    /// total_value - total_invested
    pub profit_loss: f64,

    /// profit_loss / total_invested × 100, or 0 when nothing is invested
    pub profit_loss_pct: f64,

    /// Holding with the highest personal P/L
    pub best: Option<Performer>,

    /// Holding with the lowest personal P/L
    pub worst: Option<Performer>,

    /// Pie chart slices, in holding order
    pub allocation: Vec<AllocationSlice>,
}

impl PortfolioTotals {
    /// Totals of an empty portfolio.
    pub fn zero(currency: Fiat) -> Self {
        Self {
            currency,
            holdings: 0,
            total_value: 0.0,
            total_invested: 0.0,
            profit_loss: 0.0,
            profit_loss_pct: 0.0,
            best: None,
            worst: None,
            allocation: Vec::new(),
        }
    }
}

/// A holding ranked by personal P/L.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Performer {
    pub symbol: String,
    pub profit_loss: f64,
}

/// One pie chart slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationSlice {
    pub symbol: String,
    pub value: f64,
    /// Share of total value in percent (0 when the portfolio is worth nothing)
    pub pct: f64,
    pub color: String,
}
