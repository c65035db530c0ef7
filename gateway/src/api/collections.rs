use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::{Value as JsonValue, json};

use super::ApiErrorResponse;
use crate::AppState;

#[derive(Serialize)]
pub struct CollectionsResponse {
    success: bool,
    collections: JsonValue,
}

impl IntoResponse for CollectionsResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

pub async fn site_collections(
    State(state): State<AppState>,
    Path(site_id): Path<String>,
) -> Result<CollectionsResponse, ApiErrorResponse> {
    let payload = state.client.site_collections(&site_id).await?;
    Ok(CollectionsResponse {
        success: true,
        collections: payload
            .get("collections")
            .cloned()
            .unwrap_or_else(|| json!([])),
    })
}

#[derive(Serialize)]
pub struct SchemaResponse {
    success: bool,
    collection: JsonValue,
}

impl IntoResponse for SchemaResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// The schema payload is forwarded whole; callers want the field list as the
/// CMS describes it.
pub async fn collection_schema(
    State(state): State<AppState>,
    Path(collection_id): Path<String>,
) -> Result<SchemaResponse, ApiErrorResponse> {
    let payload = state.client.collection_schema(&collection_id).await?;
    Ok(SchemaResponse {
        success: true,
        collection: payload,
    })
}
