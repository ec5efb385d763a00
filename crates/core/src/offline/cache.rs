use reqwest::Url;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

/// Identity of a resource request: method + absolute URL.
/// Two requests hit the same cache entry only if both match exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceRequest {
    pub method: String,
    pub url: Url,
}

impl ResourceRequest {
    pub fn new(method: impl Into<String>, url: Url) -> Self {
        Self {
            method: method.into().to_uppercase(),
            url,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new("GET", url)
    }
}

/// A stored (or freshly fetched) response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl CachedResponse {
    pub fn new(status: u16, content_type: Option<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One named cache: request → response.
#[derive(Debug, Clone, Default)]
pub struct Cache {
    entries: HashMap<ResourceRequest, CachedResponse>,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, request: ResourceRequest, response: CachedResponse) {
        self.entries.insert(request, response);
    }

    pub fn get(&self, request: &ResourceRequest) -> Option<&CachedResponse> {
        self.entries.get(request)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// All named caches of an origin, shared between cache manager instances
/// (an outgoing generation and its replacement see the same storage).
///
/// Cloning yields another handle to the same storage.
#[derive(Debug, Clone, Default)]
pub struct CacheStorage {
    caches: Arc<Mutex<BTreeMap<String, Cache>>>,
}

impl CacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Cache>> {
        self.caches.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Cache names, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    pub fn has(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    /// Store a complete cache under `name`, replacing any previous one.
    pub fn insert(&self, name: &str, cache: Cache) {
        self.lock().insert(name.to_string(), cache);
    }

    /// Delete a cache. Returns `false` if it did not exist.
    pub fn delete(&self, name: &str) -> bool {
        self.lock().remove(name).is_some()
    }

    /// Number of entries in the named cache (0 if absent).
    pub fn entry_count(&self, name: &str) -> usize {
        self.lock().get(name).map_or(0, Cache::len)
    }

    /// Look up a request in one named cache.
    pub fn match_in(&self, name: &str, request: &ResourceRequest) -> Option<CachedResponse> {
        self.lock().get(name)?.get(request).cloned()
    }
}

/// Application instances (open pages) and the cache generation controlling
/// each one. Shared like `CacheStorage`.
#[derive(Debug, Clone, Default)]
pub struct ClientRegistry {
    inner: Arc<Mutex<ClientTable>>,
}

#[derive(Debug, Default)]
struct ClientTable {
    next_id: u64,
    controllers: BTreeMap<u64, Option<String>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ClientTable> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a new client, optionally already controlled by a generation.
    pub fn register(&self, controller: Option<&str>) -> u64 {
        let mut table = self.lock();
        let id = table.next_id;
        table.next_id += 1;
        table.controllers.insert(id, controller.map(str::to_string));
        id
    }

    pub fn unregister(&self, id: u64) -> bool {
        self.lock().controllers.remove(&id).is_some()
    }

    pub fn controller(&self, id: u64) -> Option<String> {
        self.lock().controllers.get(&id).cloned().flatten()
    }

    /// Point every client at `generation`. Returns the number of clients.
    pub fn claim_all(&self, generation: &str) -> usize {
        let mut table = self.lock();
        for controller in table.controllers.values_mut() {
            *controller = Some(generation.to_string());
        }
        table.controllers.len()
    }

    /// Detach every client from its generation.
    pub fn release_all(&self) {
        for controller in self.lock().controllers.values_mut() {
            *controller = None;
        }
    }

    pub fn len(&self) -> usize {
        self.lock().controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
