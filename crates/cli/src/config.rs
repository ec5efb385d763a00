//! Runtime configuration of the terminal host.
//!
//! User settings (currency, refresh interval, display flags) live in the
//! state document itself; this only decides where that document is stored
//! and which API deployment to talk to.

use std::path::PathBuf;

use anyhow::Result;

/// Application name used for the data directory path
const APP_NAME: &str = "holdings";

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory of the key-value store holding the state document
    pub data_dir: PathBuf,
    /// Price API base URL
    pub api_base: String,
}

impl Config {
    /// Explicit values win; otherwise the platform data directory is used.
    pub fn resolve(data_dir: Option<PathBuf>, api_base: String) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => dirs::data_dir()
                .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?
                .join(APP_NAME),
        };
        Ok(Self { data_dir, api_base })
    }
}
