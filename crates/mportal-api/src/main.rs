//! # mportal-api: Binary Entry Point
//!
//! Starts the Axum HTTP server for the member portal API.
//! Binds to configurable port (default 8080).

use mportal_api::state::{AppConfig, AppState};
use zeroize::Zeroizing;

fn secret_from_env(name: &str) -> Option<Zeroizing<String>> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(Zeroizing::new)
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // Build configuration from environment.
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let config = AppConfig {
        port,
        auth_token: secret_from_env("PORTAL_AUTH_TOKEN"),
        automation_secret: secret_from_env("CRON_SECRET"),
    };
    if config.auth_token.is_none() {
        tracing::warn!("PORTAL_AUTH_TOKEN not set; staff authentication is disabled");
    }
    if config.automation_secret.is_none() {
        tracing::warn!("CRON_SECRET not set; batch recovery endpoint will reject every call");
    }

    // Initialize database pool (optional: absent means in-memory only).
    let db_pool = mportal_api::db::init_pool().await.map_err(|e| {
        tracing::error!("Database initialization failed: {e}");
        e
    })?;

    // Attempt to create the StoreHub client from environment.
    let storehub = match mportal_storehub::StoreHubConfig::from_env() {
        Ok(storehub_config) => {
            tracing::info!(config = ?storehub_config, "StoreHub client configured");
            match mportal_storehub::StoreHubClient::new(storehub_config) {
                Ok(client) => Some(client),
                Err(e) => {
                    tracing::error!("Failed to create StoreHub client: {e}");
                    return Err(e.into());
                }
            }
        }
        Err(e) => {
            tracing::warn!("StoreHub client not configured: {e}. Sync endpoints will return 503.");
            None
        }
    };

    let metrics = mportal_api::metrics::install_recorder().map_err(|e| {
        tracing::error!("Failed to install Prometheus recorder: {e}");
        e
    })?;

    let state = AppState::with_config(config, storehub, db_pool).with_metrics(metrics);

    // Hydrate in-memory stores from database (if connected).
    state.hydrate_from_db().await.map_err(|e| {
        tracing::error!("Database hydration failed: {e}");
        e
    })?;

    let app = mportal_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Member portal API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
