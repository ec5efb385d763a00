use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::debug;

use crate::errors::CoreError;
use crate::models::asset::{AssetCandidate, AssetDetail};
use crate::models::color::seed_pastel;
use crate::models::price::PriceTable;
use crate::models::settings::Fiat;
use super::http_client;
use super::traits::MarketDataProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

const PROVIDER: &str = "CoinGecko";

/// CoinGecko public API provider for crypto prices and metadata.
///
/// - **Free**: No API key required (public rate limits apply).
/// - **Endpoints**: `/simple/price`, `/coins/{id}`, `/search`
///
/// CoinGecko identifies assets by slug ids like "bitcoin", "ethereum";
/// holdings store these ids directly.
pub struct CoinGeckoProvider {
    client: Client,
    base_url: String,
}

impl CoinGeckoProvider {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the provider at another deployment (proxy, mirror, paid tier).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build `{base}/{segments...}?{params...}` with proper escaping.
    fn endpoint(&self, segments: &[&str], params: &[(&str, &str)]) -> Result<Url, CoreError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| CoreError::InvalidUrl(format!("{}: {e}", self.base_url)))?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| CoreError::InvalidUrl(self.base_url.clone()))?;
            path.pop_if_empty().extend(segments);
        }
        if !params.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// GET a URL and return the body of a 2xx response.
    async fn get_text(&self, url: Url) -> Result<String, CoreError> {
        debug!(provider = PROVIDER, path = url.path(), "GET");
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CoreError::Upstream {
                provider: PROVIDER.into(),
                status: status.as_u16(),
            });
        }
        Ok(resp.text().await?)
    }

    /// Parse a `/search` body into candidates, symbols uppercased.
    pub fn parse_search(body: &str) -> Result<Vec<AssetCandidate>, CoreError> {
        let resp: SearchResponse = serde_json::from_str(body)
            .map_err(|e| CoreError::Parse(format!("{PROVIDER} search: {e}")))?;
        Ok(resp
            .coins
            .into_iter()
            .map(|c| AssetCandidate::new(c.id, c.symbol, c.name))
            .collect())
    }

    /// Parse a `/simple/price` body.
    pub fn parse_prices(body: &str) -> Result<PriceTable, CoreError> {
        serde_json::from_str(body)
            .map_err(|e| CoreError::Parse(format!("{PROVIDER} prices: {e}")))
    }

    /// Parse a `/coins/{id}` body. The color is derived from the returned id,
    /// falling back to the requested one.
    pub fn parse_detail(requested_id: &str, body: &str) -> Result<AssetDetail, CoreError> {
        let resp: CoinResponse = serde_json::from_str(body)
            .map_err(|e| CoreError::Parse(format!("{PROVIDER} detail for {requested_id}: {e}")))?;

        let icon = resp
            .image
            .and_then(|img| img.small.or(img.thumb))
            .unwrap_or_default();

        let market = resp.market_data.unwrap_or_default();
        let spark: Vec<f64> = market
            .sparkline_7d
            .map(|s| s.price.into_iter().flatten().collect())
            .unwrap_or_default();

        let seed = resp
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| requested_id.to_string());

        Ok(AssetDetail {
            icon,
            spark,
            change_24h: market.price_change_percentage_24h,
            change_7d: market.price_change_percentage_7d,
            color: seed_pastel(&seed),
        })
    }
}

impl Default for CoinGeckoProvider {
    fn default() -> Self {
        Self::new()
    }
}

// ── CoinGecko API response types ────────────────────────────────────

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    coins: Vec<SearchCoin>,
}

#[derive(Deserialize)]
struct SearchCoin {
    id: String,
    symbol: String,
    name: String,
}

#[derive(Deserialize)]
struct CoinResponse {
    id: Option<String>,
    image: Option<ImageLinks>,
    market_data: Option<MarketData>,
}

#[derive(Deserialize)]
struct ImageLinks {
    small: Option<String>,
    thumb: Option<String>,
}

#[derive(Deserialize, Default)]
struct MarketData {
    price_change_percentage_24h: Option<f64>,
    price_change_percentage_7d: Option<f64>,
    sparkline_7d: Option<Sparkline>,
}

#[derive(Deserialize)]
struct Sparkline {
    #[serde(default)]
    price: Vec<Option<f64>>,
}

#[async_trait]
impl MarketDataProvider for CoinGeckoProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn search(&self, query: &str) -> Result<Vec<AssetCandidate>, CoreError> {
        let url = self.endpoint(&["search"], &[("query", query)])?;
        let body = self.get_text(url).await?;
        Self::parse_search(&body)
    }

    async fn get_prices(&self, ids: &[String], currencies: &[Fiat]) -> Result<PriceTable, CoreError> {
        let ids = ids.join(",");
        let vs = currencies
            .iter()
            .map(|c| c.code())
            .collect::<Vec<_>>()
            .join(",");
        let url = self.endpoint(
            &["simple", "price"],
            &[
                ("ids", ids.as_str()),
                ("vs_currencies", vs.as_str()),
                ("include_24hr_change", "true"),
            ],
        )?;
        let body = self.get_text(url).await?;
        Self::parse_prices(&body)
    }

    async fn get_asset_detail(&self, id: &str) -> Result<AssetDetail, CoreError> {
        let url = self.endpoint(
            &["coins", id],
            &[
                ("localization", "false"),
                ("tickers", "false"),
                ("community_data", "false"),
                ("developer_data", "false"),
                ("sparkline", "true"),
            ],
        )?;
        let body = self.get_text(url).await?;
        Self::parse_detail(id, &body)
    }
}
