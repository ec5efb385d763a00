use serde::{Deserialize, Serialize};

/// A search hit from the price API: enough to create a holding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetCandidate {
    /// Stable API identifier (e.g., "bitcoin")
    pub id: String,

    /// Ticker symbol, uppercased (e.g., "BTC")
    pub symbol: String,

    /// Human-readable name (e.g., "Bitcoin")
    pub name: String,
}

impl AssetCandidate {
    pub fn new(id: impl Into<String>, symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into().to_uppercase(),
            name: name.into(),
        }
    }
}

/// Per-asset metadata from the detail endpoint.
///
/// Change fields are optional: the upstream sometimes omits them for thinly
/// traded assets, and a missing value must not overwrite a known one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetDetail {
    /// Icon URL (may be empty)
    pub icon: String,

    /// 7-day sampled price series, oldest first
    pub spark: Vec<f64>,

    pub change_24h: Option<f64>,

    pub change_7d: Option<f64>,

    /// Derived display color (see `models::color`)
    pub color: String,
}
