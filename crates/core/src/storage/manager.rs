use std::path::Path;
use tracing::{debug, warn};

use crate::errors::CoreError;
use crate::models::portfolio::Portfolio;

use super::format::{self, STATE_KEY};
use super::store::KeyValueStore;

/// High-level storage operations: load/save the state document and
/// export/import it as a file.
pub struct StorageManager;

impl StorageManager {
    /// Load the state document from the store.
    ///
    /// A missing document yields the default state. An unreadable one is
    /// logged and also yields the default state; the next save replaces it.
    pub fn load(store: &dyn KeyValueStore) -> Result<Portfolio, CoreError> {
        let Some(raw) = store.get(STATE_KEY)? else {
            debug!(key = STATE_KEY, "No stored state, starting empty");
            return Ok(Portfolio::default());
        };

        match format::deserialize(&raw) {
            Ok(portfolio) => Ok(portfolio),
            Err(e) => {
                warn!(key = STATE_KEY, error = %e, "Stored state unreadable, starting empty");
                Ok(Portfolio::default())
            }
        }
    }

    /// Persist the state document under the state key.
    pub fn save(store: &mut dyn KeyValueStore, portfolio: &Portfolio) -> Result<(), CoreError> {
        let text = format::serialize(portfolio)?;
        store.set(STATE_KEY, &text)
    }

    /// The state document exactly as it would be downloaded.
    pub fn export_to_string(portfolio: &Portfolio) -> Result<String, CoreError> {
        format::serialize_pretty(portfolio)
    }

    pub fn export_to_file(portfolio: &Portfolio, path: impl AsRef<Path>) -> Result<(), CoreError> {
        let text = Self::export_to_string(portfolio)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Merge an exported document into `current`. See `format::merge_import`.
    pub fn import_from_str(current: &Portfolio, text: &str) -> Result<Portfolio, CoreError> {
        format::merge_import(current, text)
    }

    pub fn import_from_file(current: &Portfolio, path: impl AsRef<Path>) -> Result<Portfolio, CoreError> {
        let text = std::fs::read_to_string(path)?;
        Self::import_from_str(current, &text)
    }
}
