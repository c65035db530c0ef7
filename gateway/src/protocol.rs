//! Inbound request payloads.

use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

/// One item as submitted by a caller, before validation and cleaning.
///
/// `id` is meaningful by presence: updates must carry one, creates must not.
/// `fieldData` stays optional here so the synchronizer can report exactly
/// which item left it out instead of rejecting the whole request body.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemSubmission {
    pub id: Option<String>,
    #[serde(rename = "fieldData")]
    pub field_data: Option<Map<String, JsonValue>>,
}

/// Body of the bulk create/update endpoints.
#[derive(Debug, Deserialize)]
pub struct BulkRequest {
    #[serde(default)]
    pub items: Vec<ItemSubmission>,
}

/// Optional body of the publish endpoint.
#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    #[serde(rename = "customDomains")]
    pub custom_domains: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_bulk_request_defaults_to_empty_items() {
        let request: BulkRequest = serde_json::from_str("{}").unwrap();
        assert!(request.items.is_empty());
    }

    #[test]
    fn test_item_submission_reads_camel_case_field_data() {
        let request: BulkRequest = serde_json::from_value(json!({
            "items": [
                {"id": "item-1", "fieldData": {"name": "Widget"}},
                {"fieldData": {"name": "Gadget"}},
            ]
        }))
        .unwrap();

        assert_eq!(request.items.len(), 2);
        assert_eq!(request.items[0].id.as_deref(), Some("item-1"));
        assert_eq!(
            request.items[0].field_data.as_ref().unwrap()["name"],
            json!("Widget")
        );
        assert_eq!(request.items[1].id, None);
    }

    #[test]
    fn test_publish_request_reads_custom_domains() {
        let request: PublishRequest =
            serde_json::from_value(json!({"customDomains": ["www.example.com"]})).unwrap();
        assert_eq!(
            request.custom_domains,
            Some(vec!["www.example.com".to_owned()])
        );

        let request: PublishRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.custom_domains, None);
    }
}
