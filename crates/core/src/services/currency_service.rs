use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::models::portfolio::Portfolio;
use crate::models::settings::Fiat;

/// A cost-basis conversion that was applied after a currency switch.
/// `1 from = rate to`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FxConversion {
    pub from: Fiat,
    pub to: Fiat,
    pub rate: f64,
}

impl std::fmt::Display for FxConversion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Converted with 1 {} = {:.4} {}", self.from, self.rate, self.to)
    }
}

/// Re-expresses stored cost basis when the reference currency changes.
///
/// Prices need no conversion: the next sync fetches them in the new
/// currency. Only `avg_cost` is user data that must be rescaled.
///
/// The conversion uses whatever rate is current at switch time, so switching
/// EUR → USD → EUR does not return the original values if the rate moved in
/// between.
pub struct CurrencyService;

impl CurrencyService {
    pub fn new() -> Self {
        Self
    }

    /// Multiply every holding's average cost by `rate` (`1 from = rate to`).
    pub fn convert_cost_basis(
        &self,
        portfolio: &mut Portfolio,
        from: Fiat,
        to: Fiat,
        rate: f64,
    ) -> Result<FxConversion, CoreError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(CoreError::ValidationError(format!(
                "Exchange rate must be a positive number, got {rate}"
            )));
        }

        if from != to {
            for holding in &mut portfolio.items {
                holding.avg_cost *= rate;
            }
        }

        Ok(FxConversion { from, to, rate })
    }
}

impl Default for CurrencyService {
    fn default() -> Self {
        Self::new()
    }
}
