use std::sync::Arc;
use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::{Method, StatusCode};
use serde_json::{Value as JsonValue, json};
use shared::histogram;
use url::Url;

use crate::error::CmsError;
use crate::metrics_defs::UPSTREAM_REQUEST_DURATION;
use crate::rate_limit::RateLimiter;
use crate::types::ItemPayload;

/// Response header carrying the caller's remaining request quota.
const RATE_LIMIT_REMAINING: &str = "X-RateLimit-Remaining";

/// Missing or unparseable Retry-After headers fall back to this hint.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Request bodies are cut to this many bytes in debug logs.
const LOG_BODY_LIMIT: usize = 1000;

/// Authenticated client for the upstream CMS REST API.
///
/// Every call goes through [`CmsClient::request`], which paces itself on the
/// shared rate limiter and classifies the outcome into a [`CmsError`], so
/// callers never see a raw transport failure.
pub struct CmsClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
    limiter: Arc<RateLimiter>,
}

impl CmsClient {
    pub fn new(
        base_url: Url,
        token: Option<String>,
        request_timeout: Duration,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self, CmsError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url,
            token,
            limiter,
        })
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Issue one upstream call and classify the outcome.
    ///
    /// `path` is relative to the configured base URL. Only GET, POST and
    /// PATCH are allowed through; anything else is a caller bug surfaced as
    /// [`CmsError::UnsupportedMethod`] before any network traffic happens.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<JsonValue>,
    ) -> Result<JsonValue, CmsError> {
        let Some(token) = &self.token else {
            tracing::error!("API token not configured");
            return Err(CmsError::MissingToken);
        };

        if !matches!(method, Method::GET | Method::POST | Method::PATCH) {
            tracing::error!(%method, "unsupported HTTP method");
            return Err(CmsError::UnsupportedMethod(method));
        }

        self.limiter.throttle().await;

        let url = self.endpoint_url(path);
        tracing::info!(%method, url = %url, "sending CMS request");
        if !query.is_empty() {
            tracing::debug!(?query, "request params");
        }
        if let Some(body) = &body {
            tracing::debug!(body = %truncate_for_log(body), "request body");
        }

        let mut builder = self
            .http
            .request(method, url)
            .bearer_auth(token)
            .header(ACCEPT, "application/json");
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = &body {
            builder = builder.json(body);
        }

        let started = tokio::time::Instant::now();
        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                let error = classify_transport(e);
                tracing::error!(error = %error, "CMS request failed");
                return Err(error);
            }
        };
        histogram!(UPSTREAM_REQUEST_DURATION).record(started.elapsed().as_secs_f64());

        let status = response.status();
        tracing::info!(status = status.as_u16(), "CMS response");

        if let Some(remaining) = header_u64(&response, RATE_LIMIT_REMAINING) {
            tracing::debug!(remaining, "rate limit remaining");
            self.limiter.note_remaining_quota(remaining).await;
        }

        match status {
            StatusCode::UNAUTHORIZED => Err(CmsError::AuthRejected),
            StatusCode::NOT_FOUND => Err(CmsError::NotFound),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after_secs =
                    header_u64(&response, "Retry-After").unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                Err(CmsError::RateLimited { retry_after_secs })
            }
            s if s.is_client_error() || s.is_server_error() => {
                Err(classify_error_body(status, response).await)
            }
            _ => match response.json::<JsonValue>().await {
                Ok(payload) => Ok(payload),
                Err(e) => {
                    tracing::error!(error = %e, "invalid JSON in CMS response");
                    Err(CmsError::Decode)
                }
            },
        }
    }

    pub async fn list_sites(&self) -> Result<JsonValue, CmsError> {
        self.request(Method::GET, "sites", &[], None).await
    }

    pub async fn site_collections(&self, site_id: &str) -> Result<JsonValue, CmsError> {
        self.request(Method::GET, &format!("sites/{site_id}/collections"), &[], None)
            .await
    }

    pub async fn collection_schema(&self, collection_id: &str) -> Result<JsonValue, CmsError> {
        self.request(Method::GET, &format!("collections/{collection_id}"), &[], None)
            .await
    }

    pub async fn collection_items(
        &self,
        collection_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<JsonValue, CmsError> {
        let query = [("limit", limit.to_string()), ("offset", offset.to_string())];
        self.request(
            Method::GET,
            &format!("collections/{collection_id}/items"),
            &query,
            None,
        )
        .await
    }

    pub async fn create_items(
        &self,
        collection_id: &str,
        items: &[ItemPayload],
    ) -> Result<JsonValue, CmsError> {
        self.request(
            Method::POST,
            &format!("collections/{collection_id}/items"),
            &[],
            Some(json!({ "items": items })),
        )
        .await
    }

    pub async fn update_items(
        &self,
        collection_id: &str,
        items: &[ItemPayload],
    ) -> Result<JsonValue, CmsError> {
        self.request(
            Method::PATCH,
            &format!("collections/{collection_id}/items"),
            &[],
            Some(json!({ "items": items })),
        )
        .await
    }

    pub async fn publish_site(
        &self,
        site_id: &str,
        custom_domains: Option<&[String]>,
    ) -> Result<JsonValue, CmsError> {
        let mut body = json!({ "publishToDefaultDomain": true });
        // An empty list means the key is left out entirely, same as `None`.
        if let Some(domains) = custom_domains.filter(|domains| !domains.is_empty()) {
            body["customDomains"] = json!(domains);
        }
        self.request(
            Method::POST,
            &format!("sites/{site_id}/publish"),
            &[],
            Some(body),
        )
        .await
    }

    fn endpoint_url(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        let base_path = self.base_url.path().trim_end_matches('/');
        url.set_path(&format!("{base_path}/{path}"));
        url
    }
}

/// Extract the upstream's error message and details from a 4xx/5xx body.
///
/// Bodies that parse as JSON contribute their `message` plus `details` or
/// `errors` fields; anything else collapses to a generic message that still
/// names the status code.
async fn classify_error_body(status: StatusCode, response: reqwest::Response) -> CmsError {
    let code = status.as_u16();
    match response.json::<JsonValue>().await {
        Ok(body) => {
            let message = body
                .get("message")
                .and_then(JsonValue::as_str)
                .map(str::to_owned)
                .unwrap_or_else(|| format!("HTTP {code} error"));
            let details = body.get("details").or_else(|| body.get("errors")).cloned();
            tracing::error!(status = code, message = %message, "CMS API error");
            CmsError::Upstream {
                status: code,
                message,
                details,
            }
        }
        Err(_) => CmsError::Upstream {
            status: code,
            message: format!("HTTP {code} error - could not parse response"),
            details: None,
        },
    }
}

fn classify_transport(e: reqwest::Error) -> CmsError {
    if e.is_timeout() {
        CmsError::Timeout
    } else if e.is_connect() {
        CmsError::Connect
    } else {
        CmsError::Network(e.to_string())
    }
}

fn header_u64(response: &reqwest::Response, name: &str) -> Option<u64> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
}

fn truncate_for_log(body: &JsonValue) -> String {
    let mut text = body.to_string();
    if text.len() > LOG_BODY_LIMIT {
        let mut end = LOG_BODY_LIMIT;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
        text.push_str("... (truncated)");
    }
    text
}
