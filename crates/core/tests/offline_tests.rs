// ═══════════════════════════════════════════════════════════════════
// Offline Cache Tests — install, activate, intercept, purge
// ═══════════════════════════════════════════════════════════════════

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use holdings_core::errors::CoreError;
use holdings_core::offline::cache::{Cache, CacheStorage, CachedResponse, ClientRegistry, ResourceRequest};
use holdings_core::offline::fetcher::ResourceFetcher;
use holdings_core::offline::manager::{
    OfflineCacheManager, ServedFrom, WorkerState, APP_SHELL, CACHE_GENERATION,
};

const BASE: &str = "https://app.test/holdings/";

// ═══════════════════════════════════════════════════════════════════
// Mock fetcher
// ═══════════════════════════════════════════════════════════════════

/// Serves a fixed URL → response map. Unknown URLs are 404s; `offline`
/// makes every fetch fail like a dropped connection.
#[derive(Default)]
struct MockFetcher {
    responses: Mutex<HashMap<String, CachedResponse>>,
    offline: AtomicBool,
    calls: AtomicUsize,
}

impl MockFetcher {
    /// Every shell resource resolves to a 200 whose body is its URL.
    fn serving_shell() -> Arc<Self> {
        let fetcher = Self::default();
        {
            let mut responses = fetcher.responses.lock().unwrap();
            for locator in APP_SHELL {
                let url = reqwest::Url::parse(BASE).unwrap().join(locator).unwrap();
                responses.insert(
                    url.to_string(),
                    CachedResponse::new(200, Some("text/plain".into()), url.to_string()),
                );
            }
        }
        Arc::new(fetcher)
    }

    fn serve(&self, url: &str, response: CachedResponse) {
        self.responses.lock().unwrap().insert(url.to_string(), response);
    }

    fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResourceFetcher for MockFetcher {
    async fn fetch(&self, request: &ResourceRequest) -> Result<CachedResponse, CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(CoreError::NetworkUnavailable("offline".into()));
        }
        Ok(self
            .responses
            .lock()
            .unwrap()
            .get(request.url.as_str())
            .cloned()
            .unwrap_or_else(|| CachedResponse::new(404, None, "not found")))
    }
}

fn manager(fetcher: &Arc<MockFetcher>) -> OfflineCacheManager {
    let fetcher: Arc<dyn ResourceFetcher> = fetcher.clone();
    OfflineCacheManager::new(BASE, fetcher).unwrap()
}

fn url(locator: &str) -> reqwest::Url {
    reqwest::Url::parse(BASE).unwrap().join(locator).unwrap()
}

/// Storage holding an older generation with a single cached page.
fn storage_with_old_generation(name: &str) -> CacheStorage {
    let storage = CacheStorage::new();
    let mut cache = Cache::new();
    cache.put(
        ResourceRequest::get(url("./index.html")),
        CachedResponse::new(200, None, "old index"),
    );
    storage.insert(name, cache);
    storage
}

// ═══════════════════════════════════════════════════════════════════
// Cache primitives
// ═══════════════════════════════════════════════════════════════════

mod primitives {
    use super::*;

    #[test]
    fn request_identity_is_method_and_url() {
        let a = ResourceRequest::new("get", url("./app.js"));
        let b = ResourceRequest::get(url("./app.js"));
        assert_eq!(a, b);
        assert_eq!(a.method, "GET");
        assert_ne!(ResourceRequest::new("POST", url("./app.js")), b);
    }

    #[test]
    fn storage_handles_share_contents() {
        let storage = CacheStorage::new();
        let other = storage.clone();
        storage.insert("holdings-v1", Cache::new());
        assert!(other.has("holdings-v1"));
        assert!(other.delete("holdings-v1"));
        assert!(!storage.has("holdings-v1"));
        assert!(!storage.delete("holdings-v1"));
    }

    #[test]
    fn client_registry() {
        let clients = ClientRegistry::new();
        let a = clients.register(None);
        let b = clients.register(Some("holdings-v3"));
        assert_eq!(clients.len(), 2);
        assert_eq!(clients.controller(a), None);
        assert_eq!(clients.controller(b).as_deref(), Some("holdings-v3"));

        assert_eq!(clients.claim_all("holdings-v4"), 2);
        assert_eq!(clients.controller(a).as_deref(), Some("holdings-v4"));

        clients.release_all();
        assert_eq!(clients.controller(b), None);
        assert!(clients.unregister(a));
        assert_eq!(clients.len(), 1);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Install
// ═══════════════════════════════════════════════════════════════════

mod install {
    use super::*;

    #[tokio::test]
    async fn caches_every_shell_resource() {
        let fetcher = MockFetcher::serving_shell();
        let mut m = manager(&fetcher);
        assert_eq!(m.state(), WorkerState::Pending);

        let report = m.install_app_shell().await.unwrap();

        assert_eq!(report.generation, CACHE_GENERATION);
        // "./" and "./index.html" are distinct entries
        assert_eq!(report.cached, APP_SHELL.len());
        assert_eq!(m.storage().entry_count(CACHE_GENERATION), APP_SHELL.len());
        assert_eq!(m.state(), WorkerState::Installed);
        assert_eq!(fetcher.calls(), APP_SHELL.len());
    }

    #[tokio::test]
    async fn absolute_locators_are_kept_as_is() {
        let m = manager(&MockFetcher::serving_shell());
        let resolved = m.resolve("https://cdn.jsdelivr.net/npm/chart.js").unwrap();
        assert_eq!(resolved.as_str(), "https://cdn.jsdelivr.net/npm/chart.js");
        assert_eq!(
            m.resolve("./app.js").unwrap().as_str(),
            "https://app.test/holdings/app.js"
        );
    }

    #[tokio::test]
    async fn failed_resource_aborts_whole_install() {
        let fetcher = MockFetcher::serving_shell();
        fetcher.serve(url("./app.js").as_str(), CachedResponse::new(500, None, "boom"));
        let mut m = manager(&fetcher);

        let err = m.install_app_shell().await.unwrap_err();

        match err {
            CoreError::CacheInstall { resource, message } => {
                assert!(resource.ends_with("/app.js"));
                assert_eq!(message, "HTTP 500");
            }
            other => panic!("Expected CacheInstall, got {other:?}"),
        }
        assert!(!m.storage().has(CACHE_GENERATION));
        assert_eq!(m.state(), WorkerState::Pending);
    }

    #[tokio::test]
    async fn network_failure_leaves_older_generation_serving() {
        let fetcher = MockFetcher::serving_shell();
        fetcher.go_offline();
        let storage = storage_with_old_generation("holdings-v3");
        let mut m = manager(&fetcher).with_storage(storage.clone());

        assert!(m.install_app_shell().await.is_err());
        assert!(matches!(m.activate(), Err(CoreError::CacheNotReady(_))));
        assert_eq!(storage.keys(), vec!["holdings-v3".to_string()]);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Activate
// ═══════════════════════════════════════════════════════════════════

mod activate {
    use super::*;

    #[tokio::test]
    async fn deletes_other_generations_and_claims_clients() {
        let fetcher = MockFetcher::serving_shell();
        let storage = storage_with_old_generation("holdings-v3");
        storage.insert("holdings-v2", Cache::new());
        let clients = ClientRegistry::new();
        clients.register(Some("holdings-v3"));
        clients.register(None);

        let mut m = manager(&fetcher)
            .with_storage(storage.clone())
            .with_clients(clients.clone());
        m.install_app_shell().await.unwrap();
        let report = m.activate().unwrap();

        assert_eq!(report.deleted, vec!["holdings-v2".to_string(), "holdings-v3".to_string()]);
        assert_eq!(report.claimed, 2);
        assert_eq!(storage.keys(), vec![CACHE_GENERATION.to_string()]);
        assert_eq!(m.state(), WorkerState::Activated);
    }

    #[tokio::test]
    async fn refused_before_install() {
        let mut m = manager(&MockFetcher::serving_shell());
        assert!(matches!(m.activate(), Err(CoreError::CacheNotReady(g)) if g == CACHE_GENERATION));
        assert_eq!(m.state(), WorkerState::Pending);
    }

    #[tokio::test]
    async fn new_clients_are_controlled_once_active() {
        let mut m = manager(&MockFetcher::serving_shell());
        let early = m.register_client();
        assert_eq!(m.clients().controller(early), None);

        m.install_app_shell().await.unwrap();
        m.activate().unwrap();
        let late = m.register_client();

        assert_eq!(m.clients().controller(early).as_deref(), Some(CACHE_GENERATION));
        assert_eq!(m.clients().controller(late).as_deref(), Some(CACHE_GENERATION));
    }

    #[tokio::test]
    async fn generations_hand_over() {
        let fetcher = MockFetcher::serving_shell();
        let storage = CacheStorage::new();
        let clients = ClientRegistry::new();

        let mut old = manager(&fetcher)
            .with_generation("holdings-v3")
            .with_storage(storage.clone())
            .with_clients(clients.clone());
        old.install_app_shell().await.unwrap();
        old.activate().unwrap();
        let client = old.register_client();

        let mut new = manager(&fetcher)
            .with_storage(storage.clone())
            .with_clients(clients.clone());
        new.install_app_shell().await.unwrap();
        assert_eq!(storage.keys().len(), 2);

        new.activate().unwrap();
        assert_eq!(storage.keys(), vec![CACHE_GENERATION.to_string()]);
        assert_eq!(clients.controller(client).as_deref(), Some(CACHE_GENERATION));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Intercept
// ═══════════════════════════════════════════════════════════════════

mod intercept {
    use super::*;

    async fn installed(fetcher: &Arc<MockFetcher>) -> OfflineCacheManager {
        let mut m = manager(fetcher);
        m.install_app_shell().await.unwrap();
        m.activate().unwrap();
        m
    }

    #[tokio::test]
    async fn cache_hit_needs_no_network() {
        let fetcher = MockFetcher::serving_shell();
        let m = installed(&fetcher).await;
        let before = fetcher.calls();

        let served = m.intercept_get("./app.js").await.unwrap();

        assert_eq!(served.source, ServedFrom::Cache);
        assert_eq!(served.response.body, url("./app.js").to_string().into_bytes());
        assert_eq!(fetcher.calls(), before);
    }

    #[tokio::test]
    async fn cache_hit_while_offline() {
        let fetcher = MockFetcher::serving_shell();
        let m = installed(&fetcher).await;
        fetcher.go_offline();

        let served = m.intercept_get("./manifest.json").await.unwrap();
        assert_eq!(served.source, ServedFrom::Cache);
    }

    #[tokio::test]
    async fn miss_goes_to_network_without_caching() {
        let fetcher = MockFetcher::serving_shell();
        let api = "https://api.coingecko.com/api/v3/simple/price?ids=bitcoin";
        fetcher.serve(api, CachedResponse::new(200, Some("application/json".into()), "{}"));
        let m = installed(&fetcher).await;
        let entries = m.storage().entry_count(CACHE_GENERATION);

        let served = m.intercept_get(api).await.unwrap();
        assert_eq!(served.source, ServedFrom::Network);
        assert_eq!(served.response.body, b"{}".to_vec());

        // second request goes to the network again
        let before = fetcher.calls();
        m.intercept_get(api).await.unwrap();
        assert_eq!(fetcher.calls(), before + 1);
        assert_eq!(m.storage().entry_count(CACHE_GENERATION), entries);
    }

    #[tokio::test]
    async fn network_status_errors_are_passed_through() {
        let fetcher = MockFetcher::serving_shell();
        let m = installed(&fetcher).await;

        let served = m.intercept_get("./missing.png").await.unwrap();
        assert_eq!(served.source, ServedFrom::Network);
        assert_eq!(served.response.status, 404);
    }

    #[tokio::test]
    async fn offline_miss_serves_index() {
        let fetcher = MockFetcher::serving_shell();
        let m = installed(&fetcher).await;
        fetcher.go_offline();

        let served = m.intercept_get("./some/deep/link").await.unwrap();
        assert_eq!(served.source, ServedFrom::OfflineFallback);
        assert_eq!(served.response.body, url("./index.html").to_string().into_bytes());
    }

    #[tokio::test]
    async fn offline_without_cache_is_unavailable() {
        let fetcher = MockFetcher::serving_shell();
        fetcher.go_offline();
        let m = manager(&fetcher);

        let err = m.intercept_get("./app.js").await.unwrap_err();
        assert!(matches!(err, CoreError::OfflineUnavailable(u) if u.ends_with("/app.js")));
    }

    #[tokio::test]
    async fn request_method_is_part_of_the_key() {
        let fetcher = MockFetcher::serving_shell();
        let m = installed(&fetcher).await;
        let before = fetcher.calls();

        let post = ResourceRequest::new("POST", url("./app.js"));
        let served = m.intercept(&post).await.unwrap();

        assert_eq!(served.source, ServedFrom::Network);
        assert_eq!(fetcher.calls(), before + 1);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Purge
// ═══════════════════════════════════════════════════════════════════

mod purge {
    use super::*;

    #[tokio::test]
    async fn removes_only_own_caches_and_releases_clients() {
        let fetcher = MockFetcher::serving_shell();
        let storage = storage_with_old_generation("holdings-v3");
        storage.insert("other-app-v1", Cache::new());
        let mut m = manager(&fetcher).with_storage(storage.clone());
        m.install_app_shell().await.unwrap();
        let client = m.register_client();

        let deleted = m.purge_all();

        assert_eq!(deleted, vec!["holdings-v3".to_string(), CACHE_GENERATION.to_string()]);
        assert_eq!(storage.keys(), vec!["other-app-v1".to_string()]);
        assert_eq!(m.clients().controller(client), None);
        assert_eq!(m.state(), WorkerState::Pending);
    }

    #[tokio::test]
    async fn reinstall_after_purge() {
        let fetcher = MockFetcher::serving_shell();
        let mut m = manager(&fetcher);
        m.install_app_shell().await.unwrap();
        m.activate().unwrap();
        m.purge_all();

        fetcher.go_offline();
        assert!(m.intercept_get("./app.js").await.is_err());

        fetcher.offline.store(false, Ordering::SeqCst);
        m.install_app_shell().await.unwrap();
        assert_eq!(m.state(), WorkerState::Installed);
    }
}
