use crate::models::analytics::{AllocationSlice, Performer, PortfolioTotals};
use crate::models::color::seed_pastel;
use crate::models::portfolio::Portfolio;

/// Computes portfolio totals: value, invested, P/L, best/worst and allocation.
///
/// This is the only place totals are computed. Market value is always
/// price × amount, so the total equals the sum of per-holding values.
pub struct AnalyticsService;

impl AnalyticsService {
    pub fn new() -> Self {
        Self
    }

    pub fn compute_totals(&self, portfolio: &Portfolio) -> PortfolioTotals {
        let currency = portfolio.settings.fiat;
        if portfolio.is_empty() {
            return PortfolioTotals::zero(currency);
        }

        let mut total_value = 0.0;
        let mut total_invested = 0.0;
        let mut best: Option<Performer> = None;
        let mut worst: Option<Performer> = None;

        for holding in &portfolio.items {
            total_value += holding.market_value();
            total_invested += holding.invested();

            let pl = holding.profit_loss();
            if best.as_ref().map_or(true, |b| pl > b.profit_loss) {
                best = Some(Performer {
                    symbol: holding.symbol.clone(),
                    profit_loss: pl,
                });
            }
            if worst.as_ref().map_or(true, |w| pl < w.profit_loss) {
                worst = Some(Performer {
                    symbol: holding.symbol.clone(),
                    profit_loss: pl,
                });
            }
        }

        let profit_loss = total_value - total_invested;
        let profit_loss_pct = if total_invested > 0.0 {
            profit_loss / total_invested * 100.0
        } else {
            0.0
        };

        let allocation = portfolio
            .items
            .iter()
            .map(|h| {
                let value = h.market_value();
                AllocationSlice {
                    symbol: h.symbol.clone(),
                    value,
                    pct: if total_value > 0.0 {
                        value / total_value * 100.0
                    } else {
                        0.0
                    },
                    color: if h.color.is_empty() {
                        seed_pastel(&h.id)
                    } else {
                        h.color.clone()
                    },
                }
            })
            .collect();

        PortfolioTotals {
            currency,
            holdings: portfolio.items.len(),
            total_value,
            total_invested,
            profit_loss,
            profit_loss_pct,
            best,
            worst,
            allocation,
        }
    }
}

impl Default for AnalyticsService {
    fn default() -> Self {
        Self::new()
    }
}
