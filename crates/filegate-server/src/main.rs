//! Filegate Server - Main entry point

use anyhow::Result;
use filegate_common::logging::{init_logging, LogConfig};
use filegate_ingest::ProfileRegistry;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
use tracing::info;

use filegate_server::{
    api,
    config::Config,
    db,
    features::FeatureState,
    ingest::{IngestService, RemoteApiSink, SinkDispatcher, TableSink},
    storage::{config::StorageConfig, Storage},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Environment variables take precedence over these defaults
    let log_config = LogConfig::builder()
        .log_file_prefix("filegate-server")
        .filter_directives("filegate_server=debug,filegate_ingest=info,tower_http=debug,sqlx=warn")
        .build()
        .merge_env()?;

    let _guard = init_logging(&log_config)?;

    info!("Starting Filegate Server");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let db_pool = db::create_pool(&config.database).await?;
    info!("Database connection pool established");

    let storage = Storage::new(StorageConfig::from_env()?).await?;
    info!(bucket = storage.bucket(), "Storage client initialized");

    sqlx::migrate!("../../migrations")
        .run(&db_pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;

    info!("Database migrations completed");

    let remote = RemoteApiSink::new(
        config.sink.pricing_api_url.clone(),
        Duration::from_secs(config.sink.remote_timeout_secs),
    )?;
    let table = TableSink::new(db_pool.clone());
    let dispatcher = SinkDispatcher::new(Arc::new(remote), Arc::new(table));

    let registry = Arc::new(ProfileRegistry::builtin());
    info!(profiles = registry.profiles().len(), "Document profiles loaded");

    let state = FeatureState {
        db: db_pool,
        storage: Arc::new(storage),
        ingest: Arc::new(IngestService::new(registry, dispatcher)),
    };

    let app = api::create_router(state, &config);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.shutdown_timeout_secs))
        .await?;

    info!("Server shut down gracefully");

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }

    info!("Waiting up to {} seconds for connections to close", timeout_secs);
    tokio::time::sleep(Duration::from_secs(timeout_secs.min(5))).await;
}
