use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Default refresh interval for the price sync timer.
pub const DEFAULT_REFRESH_MINS: u32 = 5;

/// The two supported reference currencies.
/// Serialized lower-case (`"eur"`, `"usd"`), which is also the price API's
/// `vs_currency` code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fiat {
    #[default]
    Eur,
    Usd,
}

impl Fiat {
    /// Lower-case code used by the price API and in the state document.
    pub fn code(&self) -> &'static str {
        match self {
            Fiat::Eur => "eur",
            Fiat::Usd => "usd",
        }
    }

    /// ISO 4217 code for display.
    pub fn iso(&self) -> &'static str {
        match self {
            Fiat::Eur => "EUR",
            Fiat::Usd => "USD",
        }
    }
}

impl std::fmt::Display for Fiat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.iso())
    }
}

impl std::str::FromStr for Fiat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "eur" => Ok(Fiat::Eur),
            "usd" => Ok(Fiat::Usd),
            other => Err(CoreError::ValidationError(format!(
                "Unsupported currency '{other}': expected EUR or USD"
            ))),
        }
    }
}

/// User-configurable settings, stored at the top level of the state document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// The currency in which all portfolio values are displayed.
    #[serde(default)]
    pub fiat: Fiat,

    /// Minutes between automatic price refreshes.
    #[serde(default = "default_refresh_mins")]
    pub refresh_mins: u32,

    /// Show the 7-day sparkline on each holding.
    #[serde(default = "default_true")]
    pub show_spark: bool,

    /// Show the 24h / 7d change badges on each holding.
    #[serde(default = "default_true")]
    pub show_badges: bool,
}

fn default_refresh_mins() -> u32 {
    DEFAULT_REFRESH_MINS
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fiat: Fiat::Eur,
            refresh_mins: DEFAULT_REFRESH_MINS,
            show_spark: true,
            show_badges: true,
        }
    }
}

impl Settings {
    /// Reject settings the scheduler cannot honour.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.refresh_mins == 0 {
            return Err(CoreError::ValidationError(
                "Refresh interval must be at least 1 minute".into(),
            ));
        }
        Ok(())
    }

    /// Refresh interval as a duration, never shorter than one minute.
    pub fn refresh_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(u64::from(self.refresh_mins.max(1)) * 60)
    }
}
