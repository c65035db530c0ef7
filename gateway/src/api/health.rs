use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use super::ApiErrorResponse;
use crate::AppState;

/// Always HTTP 200 once a token is configured; `success` reports whether the
/// upstream accepted the credential, with `error` kept null on success so
/// callers can read it unconditionally.
#[derive(Serialize)]
pub struct HealthResponse {
    success: bool,
    error: Option<String>,
}

impl IntoResponse for HealthResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

pub async fn health_check(
    State(state): State<AppState>,
) -> Result<HealthResponse, ApiErrorResponse> {
    if !state.client.has_token() {
        return Err(ApiErrorResponse::message(
            "API token not configured. Please set CMS_API_TOKEN in the environment.",
        ));
    }

    // Cheapest authenticated call there is; proves the token works.
    match state.client.list_sites().await {
        Ok(_) => Ok(HealthResponse {
            success: true,
            error: None,
        }),
        Err(e) => Ok(HealthResponse {
            success: false,
            error: Some(e.to_string()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value as JsonValue, json};

    use crate::testutils::{spawn_gateway, spawn_mock_cms, test_client};

    #[tokio::test]
    async fn test_health_without_a_token_is_rejected() {
        let mock = spawn_mock_cms().await;
        let gateway = spawn_gateway(test_client(mock.base_url.clone(), None)).await;

        let response = reqwest::get(format!("{gateway}/api/health")).await.unwrap();
        assert_eq!(response.status(), 400);
        let body: JsonValue = response.json().await.unwrap();
        assert_eq!(
            body,
            json!({
                "success": false,
                "error": "API token not configured. Please set CMS_API_TOKEN in the environment.",
            }),
        );
        assert!(mock.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_health_reports_a_working_token() {
        let mock = spawn_mock_cms().await;
        mock.push_response(200, json!({"sites": []})).await;
        let gateway = spawn_gateway(test_client(mock.base_url.clone(), Some("test-token"))).await;

        let response = reqwest::get(format!("{gateway}/api/health")).await.unwrap();
        assert_eq!(response.status(), 200);
        let body: JsonValue = response.json().await.unwrap();
        assert_eq!(body, json!({"success": true, "error": null}));
    }

    #[tokio::test]
    async fn test_health_reports_a_rejected_token() {
        let mock = spawn_mock_cms().await;
        mock.push_response(401, json!({})).await;
        let gateway = spawn_gateway(test_client(mock.base_url.clone(), Some("test-token"))).await;

        let response = reqwest::get(format!("{gateway}/api/health")).await.unwrap();
        assert_eq!(response.status(), 200);
        let body: JsonValue = response.json().await.unwrap();
        assert_eq!(
            body,
            json!({
                "success": false,
                "error": "Invalid API token. Please check your CMS API token.",
            }),
        );
    }
}
