use std::net::SocketAddr;
use std::process::ExitCode;

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use idempotency_gateway::cache::build_cache_store;
use idempotency_gateway::{AppResult, AppState, Config, build_router, metrics, utils};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::from_env();
    match &config {
        Ok(config) => init_tracing(&config.log_level, config.log_json),
        Err(_) => init_tracing("info", false),
    }

    info!(
        "Starting Idempotency Gateway v{}",
        env!("CARGO_PKG_VERSION")
    );

    match run(config).await {
        Ok(()) => ExitCode::from(exitcode::OK as u8),
        Err(exit_code) => ExitCode::from(exit_code as u8),
    }
}

/// Install the global subscriber. `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    }
}

/// Run the application, returning an exit code on error.
async fn run(config: AppResult<Config>) -> Result<(), exitcode::ExitCode> {
    let config = config.map_err(|e| {
        error!("Configuration error: {e}");
        exitcode::CONFIG
    })?;
    info!(
        host = %config.host,
        port = %config.port,
        cache_backend = ?config.cache_backend,
        idempotency_wait_ms = config.idempotency_wait.as_millis() as u64,
        "Configuration loaded"
    );

    if let Some(metrics_addr) = config.metrics_addr() {
        metrics::try_init_metrics(metrics_addr);
    } else {
        info!("Metrics endpoint disabled (METRICS_PORT=0)");
    }

    // Connect the cache store
    let cache = build_cache_store(&config).await.map_err(|e| {
        error!("Failed to initialize cache store: {e}");
        exitcode::UNAVAILABLE
    })?;

    // Build application state and router
    let state = AppState::new(config.clone(), cache);
    let app = build_router(state.clone());

    // Start server
    let addr: SocketAddr = config.server_addr().parse().map_err(|e| {
        error!("Invalid server address: {e}");
        exitcode::CONFIG
    })?;
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        error!("Failed to bind to {addr}: {e}");
        exitcode::UNAVAILABLE
    })?;

    info!("Server listening on http://{addr}");
    info!("API endpoints:");
    info!("  GET  /                - Greeting (idempotent)");
    info!("  GET  /health          - Health check");
    info!("  GET  /sample/ping     - Ping");
    info!("  POST /sample/echo     - Echo JSON body (idempotent)");
    info!("  POST /sample/fail     - FAILED envelope (idempotent)");
    info!("  POST /sample/timeout  - Slow downstream call (idempotent)");

    // Start server with graceful shutdown
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(utils::shutdown_signal())
    .await
    .map_err(|e| {
        error!("Server error: {e}");
        exitcode::SOFTWARE
    })?;

    // Let detached handlers finish writing their results back
    info!("HTTP server stopped, draining handler tasks...");
    state.shutdown().await;

    info!("Server shutdown complete");
    Ok(())
}
