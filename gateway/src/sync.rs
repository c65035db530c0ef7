//! Bulk item synchronization: validate, clean, chunk and dispatch.

use cms_client::client::CmsClient;
use cms_client::types::ItemPayload;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value as JsonValue;
use shared::counter;

use crate::metrics_defs::{SYNC_CHUNK_FAILURES, SYNC_CHUNKS_DISPATCHED, SYNC_ITEMS_DROPPED};
use crate::normalize::normalize_field_data;
use crate::protocol::ItemSubmission;

/// Hard upstream limit on items per bulk call.
pub const CHUNK_SIZE: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SyncOperation {
    Create,
    Update,
}

impl SyncOperation {
    pub fn verb(self) -> &'static str {
        match self {
            SyncOperation::Create => "create",
            SyncOperation::Update => "update",
        }
    }
}

/// Outcome of dispatching one chunk.
#[derive(Debug, PartialEq)]
pub enum ChunkOutcome {
    Success {
        message: Option<String>,
    },
    Failure {
        error: String,
        details: Option<JsonValue>,
        status_code: Option<u16>,
    },
}

impl ChunkOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ChunkOutcome::Success { .. })
    }

    fn failure(error: String) -> Self {
        ChunkOutcome::Failure {
            error,
            details: None,
            status_code: None,
        }
    }
}

// Serialized as a `success`-tagged map so callers can branch on one boolean
// across both shapes. Serde's own tagging only supports string tags.
impl Serialize for ChunkOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ChunkOutcome::Success { message } => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("success", &true)?;
                if let Some(message) = message {
                    map.serialize_entry("message", message)?;
                }
                map.end()
            }
            ChunkOutcome::Failure {
                error,
                details,
                status_code,
            } => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("success", &false)?;
                map.serialize_entry("error", error)?;
                if let Some(details) = details {
                    map.serialize_entry("details", details)?;
                }
                if let Some(status_code) = status_code {
                    map.serialize_entry("status_code", status_code)?;
                }
                map.end()
            }
        }
    }
}

/// Ordered chunk outcomes of one synchronize call.
#[derive(Debug, PartialEq)]
pub struct BatchOutcome {
    pub chunks: Vec<ChunkOutcome>,
}

impl BatchOutcome {
    fn single(outcome: ChunkOutcome) -> Self {
        Self {
            chunks: vec![outcome],
        }
    }

    pub fn total(&self) -> usize {
        self.chunks.len()
    }

    pub fn successful(&self) -> usize {
        self.chunks.iter().filter(|c| c.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.successful()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }
}

/// Synchronize a batch of items into a collection.
///
/// Items are validated in order, cleaned, partitioned into chunks of at most
/// [`CHUNK_SIZE`] and dispatched strictly one after another. A failed chunk
/// never stops later chunks; callers must inspect every [`ChunkOutcome`] to
/// know the true status. The first structural violation short-circuits the
/// whole call before any network traffic.
pub async fn synchronize(
    client: &CmsClient,
    operation: SyncOperation,
    collection_id: &str,
    items: Vec<ItemSubmission>,
) -> BatchOutcome {
    if let Some(violation) = validate_items(operation, &items) {
        return BatchOutcome::single(violation);
    }

    let submitted = items.len();
    let cleaned = clean_items(operation, items);
    if cleaned.is_empty() {
        tracing::info!(
            submitted,
            operation = operation.verb(),
            "nothing left to send after cleaning"
        );
        return BatchOutcome::single(ChunkOutcome::Success {
            message: Some(format!(
                "No valid items to {} after cleaning",
                operation.verb()
            )),
        });
    }

    let total_chunks = cleaned.len().div_ceil(CHUNK_SIZE);
    let mut chunks = Vec::with_capacity(total_chunks);

    for (index, chunk) in cleaned.chunks(CHUNK_SIZE).enumerate() {
        tracing::info!(
            chunk = index + 1,
            total = total_chunks,
            items = chunk.len(),
            operation = operation.verb(),
            "dispatching chunk"
        );
        if let Some(first) = chunk.first() {
            let field_names: Vec<&String> = first.field_data.keys().collect();
            tracing::debug!(item_id = ?first.id, ?field_names, "first item in chunk");
        }

        counter!(SYNC_CHUNKS_DISPATCHED).increment(1);
        let result = match operation {
            SyncOperation::Create => client.create_items(collection_id, chunk).await,
            SyncOperation::Update => client.update_items(collection_id, chunk).await,
        };

        match result {
            Ok(_) => chunks.push(ChunkOutcome::Success { message: None }),
            Err(e) => {
                counter!(SYNC_CHUNK_FAILURES).increment(1);
                tracing::error!(chunk = index + 1, total = total_chunks, error = %e, "chunk failed");
                chunks.push(ChunkOutcome::Failure {
                    details: e.details().cloned(),
                    status_code: e.status(),
                    error: e.to_string(),
                });
            }
        }
    }

    let outcome = BatchOutcome { chunks };
    tracing::info!(
        successful = outcome.successful(),
        total = outcome.total(),
        operation = operation.verb(),
        "bulk operation completed"
    );
    outcome
}

/// First structural violation wins; items are checked in submission order.
fn validate_items(operation: SyncOperation, items: &[ItemSubmission]) -> Option<ChunkOutcome> {
    for (index, item) in items.iter().enumerate() {
        if operation == SyncOperation::Update
            && !item.id.as_deref().is_some_and(|id| !id.is_empty())
        {
            let error = format!("Item {index} missing required id field");
            tracing::error!(index, "item is missing its id");
            return Some(ChunkOutcome::failure(error));
        }

        if item.field_data.is_none() {
            let error = match operation {
                SyncOperation::Create => {
                    format!("New item {index} missing required fieldData field")
                }
                SyncOperation::Update => {
                    // The id was validated just above.
                    let id = item.id.as_deref().unwrap_or_default();
                    format!("Item {id} missing required fieldData field")
                }
            };
            tracing::error!(index, "item is missing its fieldData");
            return Some(ChunkOutcome::failure(error));
        }
    }
    None
}

/// Normalize every item's fields and drop the ones with nothing left to send.
/// Creates never forward an id, even when the caller sent one.
fn clean_items(operation: SyncOperation, items: Vec<ItemSubmission>) -> Vec<ItemPayload> {
    let mut cleaned = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let field_data = normalize_field_data(item.field_data.unwrap_or_default());
        if field_data.is_empty() {
            tracing::warn!(index, item_id = ?item.id, "no fields left after cleaning, skipping item");
            counter!(SYNC_ITEMS_DROPPED).increment(1);
            continue;
        }
        cleaned.push(ItemPayload {
            id: match operation {
                SyncOperation::Create => None,
                SyncOperation::Update => item.id,
            },
            field_data,
        });
    }
    cleaned
}
