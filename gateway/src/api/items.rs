use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};

use super::ApiErrorResponse;
use crate::AppState;
use crate::protocol::BulkRequest;
use crate::sync::{ChunkOutcome, SyncOperation, synchronize};

const DEFAULT_PAGE_LIMIT: u32 = 100;

#[derive(Deserialize)]
pub struct ItemsQuery {
    limit: Option<u32>,
    offset: Option<u32>,
}

#[derive(Serialize)]
pub struct ItemsResponse {
    success: bool,
    items: JsonValue,
    pagination: JsonValue,
}

impl IntoResponse for ItemsResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

pub async fn list_items(
    State(state): State<AppState>,
    Path(collection_id): Path<String>,
    query: Result<Query<ItemsQuery>, QueryRejection>,
) -> Result<ItemsResponse, ApiErrorResponse> {
    let Query(query) = query.map_err(|rejection| ApiErrorResponse::message(rejection.body_text()))?;
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    let offset = query.offset.unwrap_or(0);

    let payload = state
        .client
        .collection_items(&collection_id, limit, offset)
        .await?;
    Ok(ItemsResponse {
        success: true,
        items: payload.get("items").cloned().unwrap_or_else(|| json!([])),
        pagination: payload
            .get("pagination")
            .cloned()
            .unwrap_or_else(|| json!({})),
    })
}

#[derive(Serialize)]
pub struct BulkSuccessResponse {
    success: bool,
    message: String,
    results: Vec<ChunkOutcome>,
}

impl IntoResponse for BulkSuccessResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Aggregate view of a bulk call with at least one failed chunk. Still HTTP
/// 400: the caller has to look at `results` to see what did go through.
#[derive(Serialize)]
pub struct BulkFailureResponse {
    success: bool,
    error: String,
    successful_batches: usize,
    failed_batches: usize,
    error_details: Vec<String>,
    results: Vec<ChunkOutcome>,
}

impl IntoResponse for BulkFailureResponse {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, Json(self)).into_response()
    }
}

pub async fn create_items(
    State(state): State<AppState>,
    Path(collection_id): Path<String>,
    body: Result<Json<BulkRequest>, JsonRejection>,
) -> Response {
    bulk_sync(state, SyncOperation::Create, collection_id, body).await
}

pub async fn update_items(
    State(state): State<AppState>,
    Path(collection_id): Path<String>,
    body: Result<Json<BulkRequest>, JsonRejection>,
) -> Response {
    bulk_sync(state, SyncOperation::Update, collection_id, body).await
}

async fn bulk_sync(
    state: AppState,
    operation: SyncOperation,
    collection_id: String,
    body: Result<Json<BulkRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return ApiErrorResponse::message(rejection.body_text()).into_response();
        }
    };

    tracing::info!(
        collection_id = %collection_id,
        operation = operation.verb(),
        items = request.items.len(),
        "bulk request received"
    );

    if request.items.is_empty() {
        let error = match operation {
            SyncOperation::Create => "No items provided for creation",
            SyncOperation::Update => "No items provided for update",
        };
        tracing::error!(error, "rejecting bulk request");
        return ApiErrorResponse::message(error).into_response();
    }

    let submitted = request.items.len();

    // Dispatch runs on its own task: a caller hanging up drops this handler
    // future, and queued chunks must survive that.
    let client = state.client.clone();
    let items = request.items;
    let dispatch =
        tokio::spawn(async move { synchronize(&client, operation, &collection_id, items).await });
    let outcome = match dispatch.await {
        Ok(outcome) => outcome,
        Err(error) => {
            tracing::error!(error = %error, "bulk dispatch task failed");
            let message = format!("Server error during {}", operation.verb());
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiErrorResponse::message(message)),
            )
                .into_response();
        }
    };

    if outcome.all_succeeded() {
        let batches = outcome.total();
        let message = match operation {
            SyncOperation::Create => {
                format!("Successfully created {submitted} new items in {batches} batches")
            }
            SyncOperation::Update => {
                format!("Successfully updated {submitted} items in {batches} batches")
            }
        };
        return BulkSuccessResponse {
            success: true,
            message,
            results: outcome.chunks,
        }
        .into_response();
    }

    let error = match operation {
        SyncOperation::Create => format!(
            "{} out of {} batches failed during creation",
            outcome.failed(),
            outcome.total()
        ),
        SyncOperation::Update => {
            format!("{} out of {} batches failed", outcome.failed(), outcome.total())
        }
    };

    let error_details = outcome
        .chunks
        .iter()
        .filter_map(|chunk| match chunk {
            ChunkOutcome::Failure { error, details, .. } => Some((error, details)),
            ChunkOutcome::Success { .. } => None,
        })
        .enumerate()
        .map(|(index, (error, details))| {
            let mut line = format!("Batch {}: {error}", index + 1);
            if let Some(details) = details {
                line.push_str(&format!(" | Details: {details}"));
            }
            line
        })
        .collect();

    BulkFailureResponse {
        success: false,
        error,
        successful_batches: outcome.successful(),
        failed_batches: outcome.failed(),
        error_details,
        results: outcome.chunks,
    }
    .into_response()
}
