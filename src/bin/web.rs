// src/bin/web.rs

use contacts_app::infra::{config::ConfigError, telemetry};
use contacts_app::{transport, AppState, Config, PostgresContactStore};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match Config::load() {
        Ok(cfg) => cfg,
        Err(ConfigError::Args(err)) => err.exit(),
        Err(err) => return Err(err.into()),
    };
    telemetry::init(&config)?;

    // --- Contact Store Initialization ---
    tracing::info!(
        max_open_conns = config.db.max_open_conns,
        max_idle_conns = config.db.max_idle_conns,
        max_idle_time = ?config.db.max_idle_time,
        "connecting to database"
    );
    let store = PostgresContactStore::connect(&config.db).await?;
    store.ensure_schema().await?;
    let pool = store.pool().clone();
    tracing::info!("database ready");

    let addr = config.listen_addr();
    let app_state = AppState::new(Arc::new(store), config);

    // Expired sessions are also dropped lazily on access; this keeps abandoned ones from piling up.
    let sessions = app_state.sessions.clone();
    let purge_task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            let purged = sessions.purge_expired().await;
            if purged > 0 {
                tracing::debug!(purged, "purged expired sessions");
            }
        }
    });

    // --- HTTP Server Initialization ---
    let app = transport::http::create_router(app_state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "starting server");

    tokio::select! {
        result = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    purge_task.abort();
    pool.close().await;
    tracing::info!("shutdown complete");
    Ok(())
}
