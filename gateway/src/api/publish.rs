use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use super::ApiErrorResponse;
use crate::AppState;
use crate::protocol::PublishRequest;

#[derive(Serialize)]
pub struct PublishResponse {
    success: bool,
    message: String,
}

impl IntoResponse for PublishResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// The body is optional; publishing without one targets the default domain.
pub async fn publish_site(
    State(state): State<AppState>,
    Path(site_id): Path<String>,
    body: Result<Option<Json<PublishRequest>>, JsonRejection>,
) -> Result<PublishResponse, ApiErrorResponse> {
    let request =
        body.map_err(|rejection| ApiErrorResponse::message(rejection.body_text()))?;
    let custom_domains = request.and_then(|Json(request)| request.custom_domains);

    tracing::info!(site_id = %site_id, ?custom_domains, "publish request received");
    state
        .client
        .publish_site(&site_id, custom_domains.as_deref())
        .await?;

    Ok(PublishResponse {
        success: true,
        message: "Site published successfully".to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::{Value as JsonValue, json};

    use crate::testutils::{spawn_gateway, spawn_mock_cms, test_client};

    #[tokio::test]
    async fn test_publish_forwards_custom_domains() {
        let mock = spawn_mock_cms().await;
        let gateway = spawn_gateway(test_client(mock.base_url.clone(), Some("test-token"))).await;

        let response = reqwest::Client::new()
            .post(format!("{gateway}/api/sites/s1/publish"))
            .json(&json!({"customDomains": ["www.example.com"]}))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let body: JsonValue = response.json().await.unwrap();
        assert_eq!(
            body,
            json!({"success": true, "message": "Site published successfully"}),
        );

        let calls = mock.calls().await;
        assert_eq!(calls[0].method, "POST");
        assert_eq!(calls[0].path, "/sites/s1/publish");
        assert_eq!(
            calls[0].body,
            Some(json!({
                "publishToDefaultDomain": true,
                "customDomains": ["www.example.com"],
            })),
        );
    }

    #[tokio::test]
    async fn test_publish_without_a_body_targets_the_default_domain() {
        let mock = spawn_mock_cms().await;
        let gateway = spawn_gateway(test_client(mock.base_url.clone(), Some("test-token"))).await;

        let response = reqwest::Client::new()
            .post(format!("{gateway}/api/sites/s1/publish"))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let calls = mock.calls().await;
        assert_eq!(calls[0].body, Some(json!({"publishToDefaultDomain": true})));
    }

    #[tokio::test]
    async fn test_publish_failure_maps_to_the_error_envelope() {
        let mock = spawn_mock_cms().await;
        mock.push_response(404, json!({})).await;
        let gateway = spawn_gateway(test_client(mock.base_url.clone(), Some("test-token"))).await;

        let response = reqwest::Client::new()
            .post(format!("{gateway}/api/sites/missing/publish"))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 400);
        let body: JsonValue = response.json().await.unwrap();
        assert_eq!(
            body,
            json!({
                "success": false,
                "error": "Resource not found. Please verify site/collection IDs.",
                "status_code": 404,
            }),
        );
    }
}
