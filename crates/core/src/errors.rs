use thiserror::Error;

/// Unified error type for the entire holdings-core library.
/// Every fallible public function returns `Result<T, CoreError>`.
///
/// Network, upstream and parse failures are absorbed by the sync and search
/// paths; validation and import failures are meant to be shown to the user.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── API / Network ───────────────────────────────────────────────
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("Upstream error ({provider}): HTTP {status}")]
    Upstream { provider: String, status: u16 },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    // ── Business Logic ──────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Invalid import: {0}")]
    ImportFormat(String),

    // ── Storage ─────────────────────────────────────────────────────
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage error: {0}")]
    Storage(String),

    // ── Offline cache ───────────────────────────────────────────────
    #[error("Cache install failed for {resource}: {message}")]
    CacheInstall { resource: String, message: String },

    #[error("Cache generation not installed: {0}")]
    CacheNotReady(String),

    #[error("Resource unavailable offline: {0}")]
    OfflineUnavailable(String),
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Parse(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            return CoreError::Upstream {
                provider: "http".into(),
                status: status.as_u16(),
            };
        }

        // reqwest errors carry the full URL; strip the query string so search
        // terms and id lists stay out of logs.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };

        if e.is_decode() {
            CoreError::Parse(sanitized)
        } else {
            CoreError::NetworkUnavailable(sanitized)
        }
    }
}

impl CoreError {
    /// True for errors the host should surface directly to the user.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            CoreError::ValidationError(_) | CoreError::ImportFormat(_)
        )
    }
}
