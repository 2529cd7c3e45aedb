mod cleanup;
mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use feedback_api::AppStateInner;
use feedback_core::{Argon2Hasher, CredentialHasher};
use feedback_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "feedback=debug,feedback_api=debug,feedback_core=info,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init database
    let db = Arc::new(Database::open(&config.db_path)?);

    let hasher: Arc<dyn CredentialHasher> = match config.argon2_cost {
        Some((memory_kib, iterations, parallelism)) => {
            info!("Argon2 cost: m={} t={} p={}", memory_kib, iterations, parallelism);
            Arc::new(Argon2Hasher::with_cost(memory_kib, iterations, parallelism)?)
        }
        None => Arc::new(Argon2Hasher::default()),
    };

    let state = AppStateInner::new(
        db.clone(),
        hasher,
        config.jwt_secret.clone(),
        config.session_ttl_hours,
    )?;

    // Background cleanup of expired sessions
    tokio::spawn(cleanup::run_cleanup_loop(db, config.cleanup_interval_secs));

    let app = feedback_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Feedback server listening on {}", addr);
    info!("Sessions last {} hours", config.session_ttl_hours);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
