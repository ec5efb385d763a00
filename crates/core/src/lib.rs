pub mod errors;
pub mod models;
pub mod offline;
pub mod providers;
pub mod services;
pub mod storage;

use chrono::{DateTime, Duration, Utc};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use errors::CoreError;
use models::{
    analytics::PortfolioTotals,
    asset::AssetCandidate,
    holding::Holding,
    portfolio::Portfolio,
    settings::Settings,
};
use providers::traits::MarketDataProvider;
use services::{
    analytics_service::AnalyticsService,
    currency_service::{CurrencyService, FxConversion},
    portfolio_service::{PortfolioService, UpsertOutcome},
    price_sync_service::{PriceSyncService, SyncReport},
};
use storage::{manager::StorageManager, store::KeyValueStore};

/// Called after every state change with the new state and its totals.
pub type RenderCallback = Box<dyn Fn(&Portfolio, &PortfolioTotals) + Send + Sync>;

/// Main entry point for the holdings core library.
/// Holds the persisted state, its store, and all services operating on it.
///
/// Every mutation goes through a method here, is persisted to the store,
/// and ends with a render callback.
#[must_use]
pub struct HoldingsTracker {
    portfolio: Portfolio,
    store: Box<dyn KeyValueStore>,
    provider: Arc<dyn MarketDataProvider>,
    portfolio_service: PortfolioService,
    sync_service: PriceSyncService,
    currency_service: CurrencyService,
    analytics_service: AnalyticsService,
    on_render: Option<RenderCallback>,
}

impl std::fmt::Debug for HoldingsTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HoldingsTracker")
            .field("holdings", &self.portfolio.items.len())
            .field("settings", &self.portfolio.settings)
            .field("provider", &self.provider.name())
            .field("has_render_callback", &self.on_render.is_some())
            .finish()
    }
}

impl HoldingsTracker {
    /// Load state from `store` (empty state if nothing is stored yet).
    pub fn open(
        store: Box<dyn KeyValueStore>,
        provider: Arc<dyn MarketDataProvider>,
    ) -> Result<Self, CoreError> {
        let portfolio = StorageManager::load(store.as_ref())?;
        info!(holdings = portfolio.items.len(), "State loaded");
        Ok(Self::build(portfolio, store, provider))
    }

    fn build(
        portfolio: Portfolio,
        store: Box<dyn KeyValueStore>,
        provider: Arc<dyn MarketDataProvider>,
    ) -> Self {
        Self {
            portfolio,
            store,
            sync_service: PriceSyncService::new(Arc::clone(&provider)),
            provider,
            portfolio_service: PortfolioService::new(),
            currency_service: CurrencyService::new(),
            analytics_service: AnalyticsService::new(),
            on_render: None,
        }
    }

    /// Register the render callback.
    pub fn with_render_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Portfolio, &PortfolioTotals) + Send + Sync + 'static,
    {
        self.on_render = Some(Box::new(callback));
        self
    }

    /// Override how old detail data may get before a sync refetches it.
    pub fn with_detail_max_age(mut self, max_age: Duration) -> Self {
        self.sync_service =
            PriceSyncService::new(Arc::clone(&self.provider)).with_detail_max_age(max_age);
        self
    }

    // ── State ───────────────────────────────────────────────────────

    #[must_use]
    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.portfolio.settings
    }

    #[must_use]
    pub fn holdings(&self) -> &[Holding] {
        &self.portfolio.items
    }

    #[must_use]
    pub fn holding(&self, id: &str) -> Option<&Holding> {
        self.portfolio.find(id)
    }

    /// Totals, P/L, best/worst and allocation for the current state.
    #[must_use]
    pub fn totals(&self) -> PortfolioTotals {
        self.analytics_service.compute_totals(&self.portfolio)
    }

    /// Invoke the render callback with the current state.
    pub fn render(&self) {
        if let Some(callback) = &self.on_render {
            callback(&self.portfolio, &self.totals());
        }
    }

    // ── Holdings ────────────────────────────────────────────────────

    /// Add a holding or overwrite amount / avg cost of an existing one, then
    /// sync prices. A new holding is seeded with detail data when available.
    pub async fn add_or_update_holding(
        &mut self,
        candidate: &AssetCandidate,
        amount: f64,
        avg_cost: f64,
    ) -> Result<UpsertOutcome, CoreError> {
        PortfolioService::validate_candidate(candidate)?;
        Holding::validate_position(amount, avg_cost)?;

        let now = Utc::now();
        let detail = if self.portfolio.contains(&candidate.id) {
            None
        } else {
            self.sync_service.fetch_asset_detail(&candidate.id).await
        };

        let outcome = self.portfolio_service.upsert_holding(
            &mut self.portfolio,
            candidate,
            amount,
            avg_cost,
            detail.as_ref(),
            now,
        )?;
        self.persist()?;
        info!(id = %candidate.id, ?outcome, "Holding saved");

        self.refresh_prices().await?;
        Ok(outcome)
    }

    /// Remove a holding. Returns `false` if the id was unknown.
    pub fn remove_holding(&mut self, id: &str) -> Result<bool, CoreError> {
        let removed = self.portfolio_service.remove_holding(&mut self.portfolio, id);
        if removed {
            self.persist()?;
            self.render();
        }
        Ok(removed)
    }

    /// Remove all holdings. Returns how many were removed.
    pub fn clear_holdings(&mut self) -> Result<usize, CoreError> {
        let removed = self.portfolio_service.clear_holdings(&mut self.portfolio);
        self.persist()?;
        self.render();
        Ok(removed)
    }

    /// Replace all holdings with the sample portfolio, then sync prices.
    pub async fn load_sample(&mut self) -> Result<SyncReport, CoreError> {
        let now = Utc::now();
        let mut items = Vec::new();
        for (candidate, amount, avg_cost) in PortfolioService::sample_positions() {
            let detail = self.sync_service.fetch_asset_detail(&candidate.id).await;
            items.push(PortfolioService::new_holding(
                &candidate,
                amount,
                avg_cost,
                detail.as_ref(),
                now,
            ));
        }
        self.portfolio.items = items;
        self.persist()?;
        self.render();
        self.refresh_prices().await
    }

    // ── Settings ────────────────────────────────────────────────────

    /// Save settings. When the reference currency changes, every avg cost is
    /// converted with the current rate (if one can be derived) and the
    /// applied conversion is returned for display. Ends with a sync.
    pub async fn save_settings(
        &mut self,
        settings: Settings,
    ) -> Result<Option<FxConversion>, CoreError> {
        settings.validate()?;

        let previous = self.portfolio.settings.fiat;
        let next = settings.fiat;
        self.portfolio.settings = settings;
        self.persist()?;

        let mut conversion = None;
        if previous != next {
            match self.sync_service.fetch_exchange_rate(previous, next).await {
                Some(rate) => {
                    let applied = self.currency_service.convert_cost_basis(
                        &mut self.portfolio,
                        previous,
                        next,
                        rate,
                    )?;
                    self.persist()?;
                    info!(%previous, %next, rate, "Cost basis converted");
                    conversion = Some(applied);
                }
                None => {
                    warn!(%previous, %next, "No exchange rate, cost basis left unchanged");
                }
            }
        }

        self.refresh_prices().await?;
        Ok(conversion)
    }

    // ── Prices ──────────────────────────────────────────────────────

    /// Run one price sync cycle, persist, render.
    pub async fn refresh_prices(&mut self) -> Result<SyncReport, CoreError> {
        self.refresh_prices_at(Utc::now()).await
    }

    /// `refresh_prices` with an explicit clock, for staleness decisions.
    pub async fn refresh_prices_at(&mut self, now: DateTime<Utc>) -> Result<SyncReport, CoreError> {
        let report = self.sync_service.sync_all(&mut self.portfolio, now).await;
        if report.holdings > 0 {
            self.persist()?;
        }
        self.render();
        Ok(report)
    }

    /// Search for assets to add. Empty on failure.
    pub async fn search(&self, query: &str) -> Vec<AssetCandidate> {
        self.sync_service.search_assets(query).await
    }

    // ── Export / Import ─────────────────────────────────────────────

    /// The state document as it would be downloaded.
    pub fn export_json(&self) -> Result<String, CoreError> {
        StorageManager::export_to_string(&self.portfolio)
    }

    pub fn export_to_file(&self, path: impl AsRef<Path>) -> Result<(), CoreError> {
        StorageManager::export_to_file(&self.portfolio, path)
    }

    /// Merge an exported document into the current state, then sync.
    /// On `ImportFormat` errors the state is untouched.
    pub async fn import_json(&mut self, text: &str) -> Result<SyncReport, CoreError> {
        let merged = StorageManager::import_from_str(&self.portfolio, text)?;
        self.apply_import(merged).await
    }

    pub async fn import_from_file(&mut self, path: impl AsRef<Path>) -> Result<SyncReport, CoreError> {
        let merged = StorageManager::import_from_file(&self.portfolio, path)?;
        self.apply_import(merged).await
    }

    async fn apply_import(&mut self, merged: Portfolio) -> Result<SyncReport, CoreError> {
        self.portfolio = merged;
        self.persist()?;
        info!(holdings = self.portfolio.items.len(), "State imported");
        self.render();
        self.refresh_prices().await
    }

    fn persist(&mut self) -> Result<(), CoreError> {
        StorageManager::save(self.store.as_mut(), &self.portfolio)
    }
}
