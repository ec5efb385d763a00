//! Offline cache for the application shell: versioned resource caches,
//! cache-first request interception and generation cleanup.

pub mod cache;
pub mod fetcher;
pub mod manager;
