pub mod api;
pub mod config;
pub mod errors;
pub mod metrics_defs;
pub mod normalize;
pub mod protocol;
pub mod sync;

#[cfg(test)]
mod testutils;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use cms_client::client::CmsClient;
use cms_client::rate_limit::RateLimiter;
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use tokio::net::TcpListener;

use crate::errors::GatewayError;

#[derive(Clone)]
pub struct AppState {
    pub client: Arc<CmsClient>,
}

/// Build the API router on top of the given client.
pub fn router(client: Arc<CmsClient>) -> Router {
    Router::new()
        .route("/api/sites", get(api::sites::list_sites))
        .route(
            "/api/sites/{site_id}/collections",
            get(api::collections::site_collections),
        )
        .route(
            "/api/collections/{collection_id}",
            get(api::collections::collection_schema),
        )
        .route(
            "/api/collections/{collection_id}/items",
            get(api::items::list_items)
                .post(api::items::create_items)
                .patch(api::items::update_items),
        )
        .route(
            "/api/sites/{site_id}/publish",
            axum::routing::post(api::publish::publish_site),
        )
        .route("/api/health", get(api::health::health_check))
        .with_state(AppState { client })
}

/// Run the API and admin listeners until either one exits.
///
/// The token is optional on purpose: without one the gateway still serves
/// traffic, but every upstream-touching call fails fast with a clear message.
pub async fn run(config: config::Config, token: Option<String>) -> Result<(), GatewayError> {
    let limiter = Arc::new(RateLimiter::default());
    let client = Arc::new(CmsClient::new(
        config.upstream.base_url.clone(),
        token,
        Duration::from_secs(config.upstream.request_timeout_secs),
        limiter,
    )?);

    let app = router(client);

    let api_addr = format!("{}:{}", config.listener.host, config.listener.port);
    let admin_addr = format!(
        "{}:{}",
        config.admin_listener.host, config.admin_listener.port
    );
    let api_listener = TcpListener::bind(&api_addr).await?;
    let admin_listener = TcpListener::bind(&admin_addr).await?;
    tracing::info!(api = %api_addr, admin = %admin_addr, "gateway listening");

    let api_task = async {
        axum::serve(api_listener, app).await?;
        Ok::<(), GatewayError>(())
    };
    let admin_task = run_http_service(admin_listener, admin_service());

    tokio::try_join!(api_task, admin_task)?;
    Ok(())
}

/// Readiness means the config was accepted and the client built, both of
/// which happen before either listener binds. A missing token does not count
/// against it: a tokenless gateway still serves.
fn admin_service() -> AdminService<impl Fn() -> bool + Send + Sync + 'static, GatewayError> {
    AdminService::new(|| true)
}
