//! pdfsvc-api - HTTP API server for the PDF selection service

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pdfsvc_api::{app_router, AppState, LogConfig, LogFormat, ServerConfig};
use pdfsvc_db::{log_pool_metrics, Database, PoolConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = ServerConfig::from_env()?;
    let _file_guard = init_tracing(&config.log);

    info!(
        log_format = ?config.log.format,
        log_file = config.log.file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    let db = Database::connect(
        &config.database_url,
        PoolConfig::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(config.db_acquire_timeout),
    )
    .await?;

    if config.run_migrations {
        info!(subsystem = "database", op = "migrate", "Running migrations");
        db.migrate().await?;
    }
    log_pool_metrics(db.pool());

    let app = app_router(AppState::from_database(db), &config);

    let addr = config.bind_addr()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Install the global subscriber.
///
/// Honours `RUST_LOG` (default `pdfsvc_api=debug,pdfsvc_core=info,pdfsvc_db=info,tower_http=debug`).
/// With a log file configured, output goes to a daily-rolled file through a
/// non-blocking writer; the returned guard must live until shutdown.
fn init_tracing(log: &LogConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "pdfsvc_api=debug,pdfsvc_core=info,pdfsvc_db=info,tower_http=debug".into()
    });

    let registry = tracing_subscriber::registry().with(env_filter);

    if let Some(ref path) = log.file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("pdfsvc-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        match log.format {
            LogFormat::Json => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init(),
            LogFormat::Text => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(log.ansi.unwrap_or(false)), // no ANSI in files
                )
                .init(),
        }
        Some(guard)
    } else {
        match log.format {
            LogFormat::Json => registry
                .with(tracing_subscriber::fmt::layer().json())
                .init(),
            LogFormat::Text => {
                let mut layer = tracing_subscriber::fmt::layer();
                if let Some(ansi) = log.ansi {
                    layer = layer.with_ansi(ansi);
                }
                registry.with(layer).init();
            }
        }
        None
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
