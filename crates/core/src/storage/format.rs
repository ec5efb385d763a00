use serde_json::{Map, Value};

use crate::errors::CoreError;
use crate::models::portfolio::Portfolio;

/// Store key holding the state document.
pub const STATE_KEY: &str = "holdings.v4";

/// Suggested file name for exports.
pub const EXPORT_FILE_NAME: &str = "holdings-v4-export.json";

/// Field an imported document must carry.
pub const REQUIRED_IMPORT_FIELD: &str = "items";

/// Serialize the state document for the store (compact).
pub fn serialize(portfolio: &Portfolio) -> Result<String, CoreError> {
    serde_json::to_string(portfolio)
        .map_err(|e| CoreError::Serialization(format!("Failed to serialize state: {e}")))
}

/// Serialize the state document for export (2-space indented).
pub fn serialize_pretty(portfolio: &Portfolio) -> Result<String, CoreError> {
    serde_json::to_string_pretty(portfolio)
        .map_err(|e| CoreError::Serialization(format!("Failed to serialize state: {e}")))
}

/// Parse a stored state document. Missing settings fields take defaults.
pub fn deserialize(text: &str) -> Result<Portfolio, CoreError> {
    let portfolio: Portfolio = serde_json::from_str(text)
        .map_err(|e| CoreError::Parse(format!("Failed to parse state: {e}")))?;
    portfolio.validate()?;
    Ok(portfolio)
}

/// Overlay an imported document onto `current`, field by field at the top
/// level, and return the merged state.
///
/// Rejected with `ImportFormat` (and `current` left as is) when the text is
/// not a JSON object, has no `items`, or the merged document is not a valid
/// state (wrong shapes, out-of-range settings or positions, duplicate ids).
pub fn merge_import(current: &Portfolio, text: &str) -> Result<Portfolio, CoreError> {
    let incoming: Value = serde_json::from_str(text)
        .map_err(|e| CoreError::ImportFormat(format!("Could not read JSON: {e}")))?;

    let Value::Object(incoming) = incoming else {
        return Err(CoreError::ImportFormat(
            "Expected a JSON object at the top level".into(),
        ));
    };

    if incoming
        .get(REQUIRED_IMPORT_FIELD)
        .map_or(true, Value::is_null)
    {
        return Err(CoreError::ImportFormat(format!(
            "Missing required field `{REQUIRED_IMPORT_FIELD}`"
        )));
    }

    let mut merged = match serde_json::to_value(current)
        .map_err(|e| CoreError::Serialization(format!("Failed to serialize state: {e}")))?
    {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    merged.extend(incoming);

    let portfolio: Portfolio = serde_json::from_value(Value::Object(merged))
        .map_err(|e| CoreError::ImportFormat(format!("Invalid state document: {e}")))?;
    portfolio.validate().map_err(|e| match e {
        CoreError::ValidationError(msg) => CoreError::ImportFormat(msg),
        other => CoreError::ImportFormat(other.to_string()),
    })?;

    Ok(portfolio)
}
