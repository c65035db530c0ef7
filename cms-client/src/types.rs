use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

/// One cleaned item as sent to the CMS bulk endpoints.
///
/// Updates carry the item `id`; creates omit it entirely rather than sending
/// an empty string the upstream would reject.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "fieldData")]
    pub field_data: Map<String, JsonValue>,
}
