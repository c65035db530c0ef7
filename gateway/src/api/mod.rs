//! Inbound HTTP API.
//!
//! Handlers wrap the raw upstream payloads into `success`-tagged envelopes.
//! Failures of any kind (body rejections, validation, upstream errors) come
//! back as HTTP 400 with [`ApiErrorResponse`], so clients branch on the
//! `success` flag instead of parsing prose.

pub mod collections;
pub mod health;
pub mod items;
pub mod publish;
pub mod sites;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cms_client::error::CmsError;
use serde::Serialize;
use serde_json::Value as JsonValue;

/// Failure envelope shared by every endpoint.
#[derive(Serialize)]
pub struct ApiErrorResponse {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status_code: Option<u16>,
}

impl ApiErrorResponse {
    /// A plain failure carrying just a message.
    pub fn message(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            details: None,
            status_code: None,
        }
    }
}

impl From<CmsError> for ApiErrorResponse {
    fn from(error: CmsError) -> Self {
        Self {
            success: false,
            details: error.details().cloned(),
            status_code: error.status(),
            error: error.to_string(),
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, Json(self)).into_response()
    }
}
