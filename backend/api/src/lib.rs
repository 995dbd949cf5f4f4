//! Flexion public API service: HTTP surface over the lead store, wallet,
//! billing and auth crates. `main.rs` is a thin binary entry point; this
//! library owns the router and startup/shutdown plumbing so integration
//! tests can drive the same `Router` the binary serves.

use std::collections::HashMap;
use std::time::Duration;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tokio::signal;
use tower::ServiceBuilder;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::GovernorLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware_custom;
pub mod models;
pub mod state;

pub use config::AppConfig;
pub use state::AppState;

pub fn build_router(state: AppState) -> Router {
    let auth_rate_limit = Box::leak(Box::new(
        GovernorConfigBuilder::default()
            .per_second(state.config.rate_limiting.requests_per_second as u64)
            .burst_size(state.config.rate_limiting.burst_size)
            .finish()
            .expect("static governor config is always valid"),
    ));

    let public = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/leads", get(handlers::leads::list_leads))
        .route("/api/lead/:id", get(handlers::leads::get_lead))
        .route("/api/preview/leads", get(handlers::leads::preview_leads))
        .route("/api/dossier/sample/:key", get(handlers::leads::dossier_sample))
        .route("/api/metrics", get(handlers::metrics::scrape))
        .route("/api/webhook", post(handlers::billing::webhook));

    let rate_limited_auth = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .layer(GovernorLayer { config: auth_rate_limit });

    let protected = Router::new()
        .route("/api/auth/me", get(handlers::auth::me))
        .route("/api/auth/send-verification", post(handlers::auth::send_verification))
        .route("/api/auth/verify-email", post(handlers::auth::verify_email))
        .route("/api/unlock/:id", post(handlers::unlock::unlock_lead))
        .route("/api/dossier/:id", get(handlers::unlock::dossier))
        .route("/api/billing/checkout", post(handlers::billing::checkout))
        .route("/api/admin/leads", get(handlers::admin::list_all_leads))
        .layer(middleware::from_fn_with_state(state.clone(), middleware_custom::auth_middleware));

    Router::new()
        .merge(public)
        .merge(rate_limited_auth)
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(10)))
                .layer(middleware::from_fn(middleware_custom::security_headers_middleware))
                .layer(middleware::from_fn(middleware_custom::metrics_middleware)),
        )
        .with_state(state)
}

/// Rebuilds the whole preview-key -> lead-id map from the current active
/// listing. Run at startup and on a timer; concurrent readers never block
/// behind this (`PreviewCache` swaps the map under a short write lock).
pub async fn refresh_preview_cache(state: &AppState) {
    let mut conn = match state.store.pool().acquire().await {
        Ok(conn) => conn,
        Err(err) => {
            warn!(%err, "preview cache refresh: could not acquire connection");
            return;
        }
    };

    let filter = flx_store::lead::LeadFilter::default();
    let page = flx_store::lead::Page { offset: 0, limit: 10_000 };
    let leads = match flx_store::lead::list(&mut conn, &filter, page).await {
        Ok(leads) => leads,
        Err(err) => {
            warn!(%err, "preview cache refresh: listing failed");
            return;
        }
    };

    let secret = state.config.auth.preview_hmac_secret.as_bytes();
    let entries: HashMap<String, String> =
        leads.into_iter().map(|lead| (flx_crypto::preview_key(secret, &lead.id), lead.id)).collect();

    let count = entries.len();
    state.preview_cache.replace(entries);
    info!(count, "preview cache refreshed");
}

pub fn spawn_preview_cache_refresh(state: AppState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(state::PREVIEW_CACHE_REFRESH_INTERVAL);
        interval.tick().await; // first tick fires immediately; startup already refreshed once
        loop {
            interval.tick().await;
            refresh_preview_cache(&state).await;
        }
    });
}

pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "flx_api=info,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install ctrl+c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received ctrl+c"),
        _ = terminate => info!("received terminate signal"),
    }

    info!("starting graceful shutdown");
}
