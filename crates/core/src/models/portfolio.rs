use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::errors::CoreError;

use super::holding::Holding;
use super::settings::Settings;

/// The persisted state document. Everything in here is serialized to JSON
/// and stored under a single key.
///
/// Layout on disk: settings fields at the top level, holdings under `items`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    /// User settings (reference currency, refresh interval, display flags)
    #[serde(flatten)]
    pub settings: Settings,

    /// All holdings, in insertion order
    #[serde(default)]
    pub items: Vec<Holding>,
}

impl Portfolio {
    pub fn find(&self, id: &str) -> Option<&Holding> {
        self.items.iter().find(|h| h.id == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Holding> {
        self.items.iter_mut().find(|h| h.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Asset ids in holding order.
    pub fn ids(&self) -> Vec<String> {
        self.items.iter().map(|h| h.id.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Every holding id must appear once.
    pub fn validate_unique_ids(&self) -> Result<(), CoreError> {
        let mut seen = HashSet::new();
        for holding in &self.items {
            if !seen.insert(holding.id.as_str()) {
                return Err(CoreError::ValidationError(format!(
                    "Duplicate holding id: {}",
                    holding.id
                )));
            }
        }
        Ok(())
    }

    /// Full document check: settings, every position, unique ids.
    pub fn validate(&self) -> Result<(), CoreError> {
        self.settings.validate()?;
        for holding in &self.items {
            Holding::validate_position(holding.amount, holding.avg_cost).map_err(|e| match e {
                CoreError::ValidationError(msg) => {
                    CoreError::ValidationError(format!("{}: {msg}", holding.id))
                }
                other => other,
            })?;
        }
        self.validate_unique_ids()
    }
}
