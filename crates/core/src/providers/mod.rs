pub mod traits;

// API provider implementations
pub mod coingecko;

use reqwest::Client;
use std::time::Duration;

/// Timeout for every outbound HTTP request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client with the shared request timeout.
pub fn http_client() -> Client {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_else(|_| Client::new())
}
