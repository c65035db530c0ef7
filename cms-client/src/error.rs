use serde_json::Value as JsonValue;
use thiserror::Error;

/// Classified outcome of a failed upstream CMS call.
///
/// Every variant renders a human-readable message through `Display`;
/// [`CmsError::status`] and [`CmsError::details`] expose the structured parts
/// for callers that build API responses out of these.
#[derive(Error, Debug)]
pub enum CmsError {
    #[error("API token not configured")]
    MissingToken,

    #[error("Unsupported method: {0}")]
    UnsupportedMethod(reqwest::Method),

    #[error("Invalid API token. Please check your CMS API token.")]
    AuthRejected,

    #[error("Resource not found. Please verify site/collection IDs.")]
    NotFound,

    #[error("Rate limit exceeded. Please wait {retry_after_secs} seconds.")]
    RateLimited { retry_after_secs: u64 },

    /// Any other 4xx/5xx answer, with the message taken from the error body
    /// when the upstream sent one we could parse.
    #[error("{message}")]
    Upstream {
        status: u16,
        message: String,
        details: Option<JsonValue>,
    },

    #[error("Request timeout - CMS API took too long to respond")]
    Timeout,

    #[error("Connection error - unable to reach CMS API")]
    Connect,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid JSON response from CMS API")]
    Decode,

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl CmsError {
    /// Upstream HTTP status, for the variants that correspond to one.
    pub fn status(&self) -> Option<u16> {
        match self {
            CmsError::AuthRejected => Some(401),
            CmsError::NotFound => Some(404),
            CmsError::RateLimited { .. } => Some(429),
            CmsError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Structured error details forwarded by the upstream, if any.
    pub fn details(&self) -> Option<&JsonValue> {
        match self {
            CmsError::Upstream { details, .. } => details.as_ref(),
            _ => None,
        }
    }
}
