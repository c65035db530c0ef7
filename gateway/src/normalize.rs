//! Field-data cleaning applied to every item before it is sent upstream.

use serde_json::{Map, Value as JsonValue};

/// Reference fields the CMS rejects when they are present but empty.
const REFERENCE_FIELDS: [&str; 3] = ["tags", "gallery", "categories"];

/// Clean one item's field mapping. Never fails; it only omits or transforms
/// values. Fields are dropped when they hold serialized null markers, real
/// nulls, or empty reference values; strings that look like embedded JSON
/// objects are parsed in place.
pub fn normalize_field_data(field_data: Map<String, JsonValue>) -> Map<String, JsonValue> {
    let before = field_data.len();
    let mut cleaned = Map::new();
    for (name, value) in field_data {
        if let Some(value) = normalize_field(&name, value) {
            cleaned.insert(name, value);
        }
    }
    tracing::debug!(before, after = cleaned.len(), "Cleaned field data");
    cleaned
}

fn normalize_field(name: &str, value: JsonValue) -> Option<JsonValue> {
    match value {
        JsonValue::String(s) if s == "null" || s == "undefined" => {
            tracing::debug!(field = %name, "Dropping string null marker");
            None
        }
        JsonValue::Null => {
            tracing::debug!(field = %name, "Dropping null value");
            None
        }
        JsonValue::String(s) if s.starts_with('{') && s.ends_with('}') => {
            match serde_json::from_str(&s) {
                Ok(parsed) => {
                    tracing::debug!(field = %name, "Parsed embedded JSON object");
                    Some(parsed)
                }
                // Not actually JSON, keep the original string.
                Err(_) => Some(JsonValue::String(s)),
            }
        }
        JsonValue::String(s) if s.trim().is_empty() && is_reference_field(name) => {
            tracing::debug!(field = %name, "Dropping empty reference field");
            None
        }
        JsonValue::Array(items) if items.is_empty() && is_reference_field(name) => {
            tracing::debug!(field = %name, "Dropping empty reference array");
            None
        }
        value => Some(value),
    }
}

fn is_reference_field(name: &str) -> bool {
    REFERENCE_FIELDS.contains(&name)
}
