use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use flx_api::{build_router, config::AppConfig, refresh_preview_cache, spawn_preview_cache_refresh, state::AppState};

/// Flexion public API server.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a `.env` file to load before reading the environment.
    #[arg(short, long)]
    env_file: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    flx_api::init_tracing();

    let args = Args::parse();
    if let Some(path) = &args.env_file {
        dotenv::from_path(path).ok();
    }

    info!("starting flexion api v{}", env!("CARGO_PKG_VERSION"));

    let config = Arc::new(AppConfig::from_env()?);
    let store = Arc::new(flx_store::Store::open(&config.store.path).await?);
    info!(path = %config.store.path, "lead store opened");

    let state = AppState::new(store, config.clone());

    refresh_preview_cache(&state).await;
    spawn_preview_cache_refresh(state.clone());

    let app = build_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!(%addr, "binding listener");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).with_graceful_shutdown(flx_api::shutdown_signal()).await?;

    info!("flexion api shutdown complete");
    Ok(())
}
