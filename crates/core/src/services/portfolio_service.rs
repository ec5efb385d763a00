use chrono::{DateTime, Utc};

use crate::errors::CoreError;
use crate::models::asset::{AssetCandidate, AssetDetail};
use crate::models::holding::Holding;
use crate::models::portfolio::Portfolio;

/// Whether an upsert created a new holding or edited an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Added,
    Updated,
}

/// The demo portfolio: (id, symbol, name, amount, avg_cost in EUR).
pub const SAMPLE_HOLDINGS: &[(&str, &str, &str, f64, f64)] = &[
    ("bitcoin", "BTC", "Bitcoin", 0.009_154_95, 100_000.0),
    ("ethereum", "ETH", "Ethereum", 0.102_160_61, 3_000.0),
    ("cardano", "ADA", "Cardano", 951.001_000_85, 0.5),
    ("solana", "SOL", "Solana", 1.131_01, 100.0),
    ("enjincoin", "ENJ", "Enjin", 1_729.2, 0.2),
];

/// User-driven holding CRUD: add, edit, remove, clear.
///
/// Works on the in-memory portfolio only. Market fields are never touched
/// here except when seeding a brand-new holding from detail data.
pub struct PortfolioService;

impl PortfolioService {
    pub fn new() -> Self {
        Self
    }

    /// Add a holding, or overwrite amount / avg cost of the existing holding
    /// with the same id. Validation failures leave the portfolio untouched.
    ///
    /// `detail` seeds icon, series, changes and color of a new holding and
    /// is ignored for existing ones.
    pub fn upsert_holding(
        &self,
        portfolio: &mut Portfolio,
        candidate: &AssetCandidate,
        amount: f64,
        avg_cost: f64,
        detail: Option<&AssetDetail>,
        now: DateTime<Utc>,
    ) -> Result<UpsertOutcome, CoreError> {
        Self::validate_candidate(candidate)?;
        Holding::validate_position(amount, avg_cost)?;

        if let Some(existing) = portfolio.find_mut(&candidate.id) {
            existing.amount = amount;
            existing.avg_cost = avg_cost;
            existing.value = existing.market_value();
            return Ok(UpsertOutcome::Updated);
        }

        portfolio
            .items
            .push(Self::new_holding(candidate, amount, avg_cost, detail, now));
        Ok(UpsertOutcome::Added)
    }

    /// Remove a holding by id. Returns `false` if there was none.
    pub fn remove_holding(&self, portfolio: &mut Portfolio, id: &str) -> bool {
        let before = portfolio.items.len();
        portfolio.items.retain(|h| h.id != id);
        portfolio.items.len() != before
    }

    /// Remove every holding. Settings are kept.
    pub fn clear_holdings(&self, portfolio: &mut Portfolio) -> usize {
        let removed = portfolio.items.len();
        portfolio.items.clear();
        removed
    }

    /// Build a holding that has not been synced yet.
    pub fn new_holding(
        candidate: &AssetCandidate,
        amount: f64,
        avg_cost: f64,
        detail: Option<&AssetDetail>,
        now: DateTime<Utc>,
    ) -> Holding {
        let mut holding = Holding::new(candidate, amount, avg_cost);
        if let Some(detail) = detail {
            holding.apply_detail(detail, now);
            if let Some(change) = detail.change_24h {
                holding.change_24h = change;
            }
        }
        holding
    }

    /// The sample portfolio as (candidate, amount, avg_cost).
    pub fn sample_positions() -> Vec<(AssetCandidate, f64, f64)> {
        SAMPLE_HOLDINGS
            .iter()
            .map(|(id, symbol, name, amount, avg_cost)| {
                (AssetCandidate::new(*id, *symbol, *name), *amount, *avg_cost)
            })
            .collect()
    }

    /// A candidate must carry an asset id before anything is fetched for it.
    pub fn validate_candidate(candidate: &AssetCandidate) -> Result<(), CoreError> {
        if candidate.id.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "Pick an asset from the search results first".into(),
            ));
        }
        Ok(())
    }
}

impl Default for PortfolioService {
    fn default() -> Self {
        Self::new()
    }
}
