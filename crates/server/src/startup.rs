use std::net::SocketAddr;

use axum::Router;
use common::utils::logging::init_logging;
use configs::AppConfig;
use dotenvy::dotenv;
use service::storage::LocalFileStore;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::auth::{ServerAuthConfig, ServerState};
use crate::errors::StartupError;
use crate::routes;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bind address: {e}")))
}

/// Assemble state and router from a validated configuration.
pub async fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let db = models::db::connect_with_config(&cfg.database).await?;
    let store = LocalFileStore::new(&cfg.storage.upload_dir, cfg.storage.max_upload_bytes);
    let state = ServerState::new(
        db,
        ServerAuthConfig { jwt_secret: cfg.auth.jwt_secret.clone(), token_ttl_hours: cfg.auth.token_ttl_hours },
        store,
    );
    Ok(routes::build_router(state, build_cors(), cfg.server.static_dir.as_deref()))
}

/// Public entry: load configuration, build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    let cfg = AppConfig::load_or_env().map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    init_logging(cfg.log.json);

    if cfg.auth.jwt_secret == configs::DEV_JWT_SECRET {
        warn!("using the built-in development JWT secret; set JWT_SECRET in production");
    }

    service::runtime::ensure_env(cfg.server.static_dir.as_deref(), &cfg.storage.upload_dir)
        .await
        .map_err(|e| StartupError::Runtime(e.to_string()))?;

    let app = build_app(&cfg).await?;

    let addr = bind_addr(&cfg)?;
    info!(%addr, upload_dir = %cfg.storage.upload_dir, "starting deploy tracker");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
