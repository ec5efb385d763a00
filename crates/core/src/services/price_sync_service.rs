use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::models::asset::{AssetCandidate, AssetDetail};
use crate::models::portfolio::Portfolio;
use crate::models::price::PriceTable;
use crate::models::settings::Fiat;
use crate::providers::traits::MarketDataProvider;

/// Asset priced in both currencies to derive the EUR/USD cross rate.
pub const FX_REFERENCE_ASSET: &str = "bitcoin";

/// Queries shorter than this (after trimming) are not sent upstream.
pub const MIN_SEARCH_QUERY_LEN: usize = 2;

/// Detail data older than this is refetched on the next cycle.
pub const DEFAULT_DETAIL_MAX_AGE_HOURS: i64 = 6;

/// What one sync cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Holdings in the portfolio at the start of the cycle
    pub holdings: usize,
    /// Holdings that received a price this cycle
    pub priced: usize,
    /// Holdings whose detail data was refreshed
    pub details_refreshed: usize,
    /// Detail requests that failed (prior values kept)
    pub details_failed: usize,
    /// Requests sent upstream
    pub network_calls: usize,
}

/// Keeps each holding's market fields fresh.
///
/// One cycle is one bulk price request for every held asset, followed by
/// per-asset detail requests for holdings whose detail data is stale.
/// Every upstream failure degrades to "keep the previous value"; nothing here
/// returns an error, and the next cycle is the retry.
pub struct PriceSyncService {
    provider: Arc<dyn MarketDataProvider>,
    detail_max_age: Duration,
}

impl PriceSyncService {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self {
            provider,
            detail_max_age: Duration::hours(DEFAULT_DETAIL_MAX_AGE_HOURS),
        }
    }

    /// Override the staleness threshold for detail data.
    pub fn with_detail_max_age(mut self, max_age: Duration) -> Self {
        self.detail_max_age = max_age;
        self
    }

    pub fn detail_max_age(&self) -> Duration {
        self.detail_max_age
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Refresh prices (and stale details) for every holding in place.
    ///
    /// 1. Empty portfolio → no requests.
    /// 2. One bulk request for all ids in the reference currency.
    /// 3. Merge prices; missing entries keep the previous price.
    /// 4. Detail requests for stale holdings, concurrently, after the bulk
    ///    request has finished. Each result is applied by id.
    ///
    /// Persisting and rendering are the caller's job.
    pub async fn sync_all(&self, portfolio: &mut Portfolio, now: DateTime<Utc>) -> SyncReport {
        let mut report = SyncReport {
            holdings: portfolio.items.len(),
            ..SyncReport::default()
        };

        if portfolio.is_empty() {
            debug!("No holdings, skipping price sync");
            return report;
        }

        let fiat = portfolio.settings.fiat;
        let ids = portfolio.ids();

        report.network_calls += 1;
        let table = match self.provider.get_prices(&ids, &[fiat]).await {
            Ok(table) => table,
            Err(e) => {
                warn!(provider = self.provider.name(), error = %e, "Bulk price request failed, keeping previous prices");
                PriceTable::new()
            }
        };

        for holding in &mut portfolio.items {
            let quote = table.quote(&holding.id, fiat);
            if quote.price.is_some() {
                report.priced += 1;
            }
            holding.apply_quote(&quote);
        }

        let stale: Vec<String> = portfolio
            .items
            .iter()
            .filter(|h| h.needs_detail_refresh(now, self.detail_max_age))
            .map(|h| h.id.clone())
            .collect();

        if !stale.is_empty() {
            debug!(count = stale.len(), "Refreshing stale asset details");
            report.network_calls += stale.len();

            let results = join_all(stale.iter().map(|id| async move {
                (id.as_str(), self.fetch_asset_detail(id).await)
            }))
            .await;

            for (id, detail) in results {
                match (detail, portfolio.find_mut(id)) {
                    (Some(detail), Some(holding)) => {
                        holding.apply_detail(&detail, now);
                        report.details_refreshed += 1;
                    }
                    (None, _) => report.details_failed += 1,
                    (Some(_), None) => {}
                }
            }
        }

        info!(
            holdings = report.holdings,
            priced = report.priced,
            details = report.details_refreshed,
            failed = report.details_failed,
            "Price sync finished"
        );
        report
    }

    /// Search the provider for assets. Empty on short queries and on any failure.
    pub async fn search_assets(&self, query: &str) -> Vec<AssetCandidate> {
        let query = query.trim();
        if query.chars().count() < MIN_SEARCH_QUERY_LEN {
            return Vec::new();
        }
        match self.provider.search(query).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(provider = self.provider.name(), error = %e, "Asset search failed");
                Vec::new()
            }
        }
    }

    /// Detail data for one asset, or `None` on any failure.
    /// Callers must keep prior values when this returns `None`.
    pub async fn fetch_asset_detail(&self, id: &str) -> Option<AssetDetail> {
        match self.provider.get_asset_detail(id).await {
            Ok(detail) => Some(detail),
            Err(e) => {
                warn!(provider = self.provider.name(), id, error = %e, "Asset detail request failed");
                None
            }
        }
    }

    /// Cross rate such that `1 base = rate quote`, derived from the reference
    /// asset's price in both currencies. `None` if either price is missing.
    pub async fn fetch_exchange_rate(&self, base: Fiat, quote: Fiat) -> Option<f64> {
        if base == quote {
            return Some(1.0);
        }

        let ids = [FX_REFERENCE_ASSET.to_string()];
        let table = match self.provider.get_prices(&ids, &[base, quote]).await {
            Ok(table) => table,
            Err(e) => {
                warn!(provider = self.provider.name(), error = %e, "Exchange rate request failed");
                return None;
            }
        };

        let base_price = table.price(FX_REFERENCE_ASSET, base).filter(|p| *p > 0.0)?;
        let quote_price = table.price(FX_REFERENCE_ASSET, quote).filter(|p| *p > 0.0)?;
        let rate = quote_price / base_price;
        debug!(%base, %quote, rate, "Derived exchange rate");
        Some(rate)
    }
}
