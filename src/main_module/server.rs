//! HTTP server initialization and routing

use anyhow::Context;
use axum::{routing::get, Router};
use log::{error, info, warn};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::config::AppConfig;
use crate::core::shared::state::AppState;
use crate::core::shared::utils::{create_pool, redact_database_url, run_migrations};
use crate::crm::store::{CrmStore, MemoryCrmStore, PgCrmStore};

use super::{health_check, shutdown_signal};

/// Full application router. Tests drive this directly.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(crate::crm::configure_crm_routes())
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn run_axum_server(app_state: Arc<AppState>) -> std::io::Result<()> {
    let addr = app_state.config.bind_addr();
    let app = build_router(app_state.clone());

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(
                "Failed to bind to {}: {} - is another instance running?",
                addr, e
            );
            return Err(e);
        }
    };
    info!(
        "HTTP server listening on {} (storage: {})",
        addr,
        app_state.store.backend()
    );

    let result = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(std::io::Error::other);

    let flushed = app_state.field_edits.flush().await;
    info!("Server stopped; {} pending field edit(s) committed", flushed);
    result
}

/// PostgreSQL when a database URL is configured, otherwise the in-memory store.
pub fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn CrmStore>> {
    let Some(url) = config.database.resolved_url() else {
        warn!("No database configured; using the in-memory store (data is lost on exit)");
        return Ok(Arc::new(MemoryCrmStore::new()));
    };

    info!("Connecting to {}", redact_database_url(&url));
    let pool = create_pool(&url, config.database.pool_size)
        .with_context(|| format!("Failed to connect to {}", redact_database_url(&url)))?;

    if config.database.run_migrations {
        run_migrations(&pool).map_err(|e| anyhow::anyhow!("{}", e))?;
        info!("Database migrations up to date");
    }

    Ok(Arc::new(PgCrmStore::new(pool)))
}
