//! mlsim - train, test and replay a binary classifier over a time-ordered
//! dataset.

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mlsim_backend::api::{create_router, AppState};
use mlsim_backend::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; real environment variables win.
    dotenv().ok();
    init_tracing();

    let config = Config::parse();
    info!(
        delay_ms = config.simulation_delay_ms,
        max_upload_mb = config.max_upload_mb,
        n_estimators = config.n_estimators,
        max_depth = config.max_depth,
        "Starting mlsim backend"
    );

    let addr = config.bind_addr();
    let app = create_router(AppState::new(config));

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("API server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

/// Initialize tracing
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mlsim_backend=debug,mlsim=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
