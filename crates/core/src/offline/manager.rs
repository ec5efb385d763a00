use futures::future::join_all;
use reqwest::Url;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::errors::CoreError;

use super::cache::{Cache, CacheStorage, CachedResponse, ClientRegistry, ResourceRequest};
use super::fetcher::ResourceFetcher;

/// Prefix shared by every cache generation this app creates.
pub const CACHE_PREFIX: &str = "holdings-";

/// The current cache generation. Bump on every deployment of the shell.
pub const CACHE_GENERATION: &str = "holdings-v4";

/// Resources making up the application shell, relative to the app base URL.
pub const APP_SHELL: &[&str] = &[
    "./",
    "./index.html",
    "./app.js",
    "./manifest.json",
    "./icon-192.png",
    "./icon-512.png",
    "https://cdn.jsdelivr.net/npm/chart.js",
];

/// Served when a request misses the cache and the network is down.
pub const OFFLINE_FALLBACK: &str = "./index.html";

/// Lifecycle of one cache generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Registered, nothing cached yet (or the last install failed)
    Pending,
    /// Every shell resource is cached; waiting for activation
    Installed,
    /// Stale generations purged, clients claimed
    Activated,
}

/// Where an intercepted response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServedFrom {
    Cache,
    Network,
    OfflineFallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    pub response: CachedResponse,
    pub source: ServedFrom,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub generation: String,
    pub cached: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivateReport {
    /// Generations deleted, sorted
    pub deleted: Vec<String>,
    /// Clients now controlled by this generation
    pub claimed: usize,
}

/// Keeps the application shell available offline.
///
/// - `install` fetches the whole shell into a cache named after the
///   generation tag, all or nothing.
/// - `activate` deletes every other generation and claims all clients.
/// - `intercept` is cache-first, then network, then the offline page.
///
/// The cache is fixed at install time: network responses are never
/// written back.
pub struct OfflineCacheManager {
    generation: String,
    base_url: Url,
    storage: CacheStorage,
    clients: ClientRegistry,
    fetcher: Arc<dyn ResourceFetcher>,
    state: WorkerState,
}

impl OfflineCacheManager {
    /// A manager for the current generation with fresh storage.
    pub fn new(base_url: &str, fetcher: Arc<dyn ResourceFetcher>) -> Result<Self, CoreError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| CoreError::InvalidUrl(format!("{base_url}: {e}")))?;
        Ok(Self {
            generation: CACHE_GENERATION.to_string(),
            base_url,
            storage: CacheStorage::new(),
            clients: ClientRegistry::new(),
            fetcher,
            state: WorkerState::Pending,
        })
    }

    /// Use another generation tag.
    pub fn with_generation(mut self, generation: impl Into<String>) -> Self {
        self.generation = generation.into();
        self
    }

    /// Share cache storage with other generations of the same app.
    pub fn with_storage(mut self, storage: CacheStorage) -> Self {
        self.storage = storage;
        self
    }

    /// Share the client registry with other generations of the same app.
    pub fn with_clients(mut self, clients: ClientRegistry) -> Self {
        self.clients = clients;
        self
    }

    pub fn generation(&self) -> &str {
        &self.generation
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn storage(&self) -> &CacheStorage {
        &self.storage
    }

    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    /// Resolve a locator (relative or absolute) against the app base URL.
    pub fn resolve(&self, locator: &str) -> Result<Url, CoreError> {
        self.base_url
            .join(locator)
            .map_err(|e| CoreError::InvalidUrl(format!("{locator}: {e}")))
    }

    /// Fetch every resource and store them under this generation's tag.
    ///
    /// Fetches run concurrently. If any fetch fails or returns a non-2xx
    /// status, nothing is stored and the generation stays absent.
    pub async fn install(&mut self, resources: &[&str]) -> Result<InstallReport, CoreError> {
        let requests = resources
            .iter()
            .map(|locator| self.resolve(locator).map(ResourceRequest::get))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(generation = %self.generation, count = requests.len(), "Installing shell resources");

        let fetcher = &self.fetcher;
        let responses = join_all(requests.iter().map(|req| fetcher.fetch(req))).await;

        let mut cache = Cache::new();
        for (request, response) in requests.into_iter().zip(responses) {
            let resource = request.url.to_string();
            match response {
                Ok(resp) if resp.is_success() => cache.put(request, resp),
                Ok(resp) => {
                    warn!(generation = %self.generation, %resource, status = resp.status, "Install aborted");
                    return Err(CoreError::CacheInstall {
                        resource,
                        message: format!("HTTP {}", resp.status),
                    });
                }
                Err(e) => {
                    warn!(generation = %self.generation, %resource, error = %e, "Install aborted");
                    return Err(CoreError::CacheInstall {
                        resource,
                        message: e.to_string(),
                    });
                }
            }
        }

        let cached = cache.len();
        self.storage.insert(&self.generation, cache);
        self.state = WorkerState::Installed;
        info!(generation = %self.generation, cached, "Shell cached");

        Ok(InstallReport {
            generation: self.generation.clone(),
            cached,
        })
    }

    /// Install the standard application shell.
    pub async fn install_app_shell(&mut self) -> Result<InstallReport, CoreError> {
        self.install(APP_SHELL).await
    }

    /// Delete every generation except this one and claim all clients.
    ///
    /// Refused (nothing deleted) if this generation was never installed.
    pub fn activate(&mut self) -> Result<ActivateReport, CoreError> {
        if !self.storage.has(&self.generation) {
            return Err(CoreError::CacheNotReady(self.generation.clone()));
        }

        let deleted: Vec<String> = self
            .storage
            .keys()
            .into_iter()
            .filter(|name| *name != self.generation)
            .filter(|name| self.storage.delete(name))
            .collect();

        let claimed = self.clients.claim_all(&self.generation);
        self.state = WorkerState::Activated;
        info!(generation = %self.generation, deleted = deleted.len(), claimed, "Generation activated");

        Ok(ActivateReport { deleted, claimed })
    }

    /// Answer a request: cache hit, else network, else the offline page.
    pub async fn intercept(&self, request: &ResourceRequest) -> Result<Served, CoreError> {
        if let Some(response) = self.storage.match_in(&self.generation, request) {
            return Ok(Served {
                response,
                source: ServedFrom::Cache,
            });
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => Ok(Served {
                response,
                source: ServedFrom::Network,
            }),
            Err(e) => {
                debug!(url = %request.url, error = %e, "Network failed, trying offline page");
                let fallback = ResourceRequest::get(self.resolve(OFFLINE_FALLBACK)?);
                self.storage
                    .match_in(&self.generation, &fallback)
                    .map(|response| Served {
                        response,
                        source: ServedFrom::OfflineFallback,
                    })
                    .ok_or_else(|| CoreError::OfflineUnavailable(request.url.to_string()))
            }
        }
    }

    /// `intercept` for a GET of a locator relative to the base URL.
    pub async fn intercept_get(&self, locator: &str) -> Result<Served, CoreError> {
        let request = ResourceRequest::get(self.resolve(locator)?);
        self.intercept(&request).await
    }

    /// Register an open application instance. It is controlled right away
    /// when this generation is already active.
    pub fn register_client(&self) -> u64 {
        let controller = (self.state == WorkerState::Activated).then_some(self.generation.as_str());
        self.clients.register(controller)
    }

    /// Force refresh: delete every cache owned by this app (any generation)
    /// and release all clients. The next start reinstalls from scratch.
    pub fn purge_all(&mut self) -> Vec<String> {
        let deleted: Vec<String> = self
            .storage
            .keys()
            .into_iter()
            .filter(|name| name.starts_with(CACHE_PREFIX))
            .filter(|name| self.storage.delete(name))
            .collect();
        self.clients.release_all();
        self.state = WorkerState::Pending;
        info!(deleted = deleted.len(), "Purged offline caches");
        deleted
    }
}
