//! Argument parsers for filters and metadata pairs.

use domain_collection::{Filter, MetadataValue};

/// Parse a JSON object such as `{"source": "wiki"}` into a filter
pub fn filter(raw: &str) -> Result<Filter, String> {
    serde_json::from_str(raw).map_err(|e| format!("expected a JSON object: {}", e))
}

/// Parse `key=value`; the value becomes a bool, integer or float when it reads as one
pub fn metadata_pair(raw: &str) -> Result<(String, MetadataValue), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;

    if key.is_empty() {
        return Err("metadata key must not be empty".to_string());
    }

    let value = if let Ok(b) = value.parse::<bool>() {
        MetadataValue::Bool(b)
    } else if let Ok(i) = value.parse::<i64>() {
        MetadataValue::Int(i)
    } else if let Ok(f) = value.parse::<f64>() {
        MetadataValue::Float(f)
    } else {
        MetadataValue::Str(value.to_string())
    };

    Ok((key.to_string(), value))
}
