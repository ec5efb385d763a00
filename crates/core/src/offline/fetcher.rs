use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};
use tracing::debug;

use crate::errors::CoreError;
use crate::providers::http_client;

use super::cache::{CachedResponse, ResourceRequest};

/// Network side of the offline cache.
///
/// Any HTTP status is a successful fetch; only a request that never
/// completed is an error.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch(&self, request: &ResourceRequest) -> Result<CachedResponse, CoreError>;
}

/// `reqwest`-backed fetcher.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: http_client(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResourceFetcher for HttpFetcher {
    async fn fetch(&self, request: &ResourceRequest) -> Result<CachedResponse, CoreError> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| CoreError::ValidationError(format!("Invalid method {}", request.method)))?;

        debug!(method = %method, url = %request.url, "Fetching resource");
        let resp = self
            .client
            .request(method, request.url.clone())
            .send()
            .await
            .map_err(|e| CoreError::NetworkUnavailable(e.to_string()))?;

        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp
            .bytes()
            .await
            .map_err(|e| CoreError::NetworkUnavailable(e.to_string()))?;

        Ok(CachedResponse::new(status, content_type, body.to_vec()))
    }
}
