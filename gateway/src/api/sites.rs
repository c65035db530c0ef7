use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::{Value as JsonValue, json};

use super::ApiErrorResponse;
use crate::AppState;

#[derive(Serialize)]
pub struct SitesResponse {
    success: bool,
    sites: JsonValue,
}

impl IntoResponse for SitesResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

pub async fn list_sites(State(state): State<AppState>) -> Result<SitesResponse, ApiErrorResponse> {
    let payload = state.client.list_sites().await?;
    Ok(SitesResponse {
        success: true,
        sites: payload.get("sites").cloned().unwrap_or_else(|| json!([])),
    })
}
