use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::asset::{AssetCandidate, AssetDetail};
use crate::models::price::PriceTable;
use crate::models::settings::Fiat;

/// Trait abstraction for the market data source.
///
/// The sync service only talks to this trait, so the HTTP implementation
/// (CoinGecko) can be swapped, and tests can plug in a scripted provider.
/// Implementations report failures as `CoreError`; deciding to absorb them
/// is the caller's job.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Free-text asset search, best match first.
    async fn search(&self, query: &str) -> Result<Vec<AssetCandidate>, CoreError>;

    /// One bulk request: current price and 24h change for every id in every
    /// requested currency.
    async fn get_prices(&self, ids: &[String], currencies: &[Fiat]) -> Result<PriceTable, CoreError>;

    /// Icon, 7-day series and percent changes for a single asset.
    async fn get_asset_detail(&self, id: &str) -> Result<AssetDetail, CoreError>;
}
