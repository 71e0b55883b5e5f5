#![doc = include_str!("../README.md")]

mod server;

use clap::Parser;
use server::config::{CliArgs, ServerConfig};
use server::service::handler::{AppState, router};
use server::telemetry::init_telemetry;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::net::TcpListener;
use tokio::signal;
use uidgen::{Clock, TimeSource};

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    init_telemetry(config.log_format)?;

    let clock = checked_clock(&config)?;
    let state = AppState::new(&config, clock)?;
    let serving = state.serving();

    let listener = TcpListener::bind(&config.server_addr).await?;
    log_startup_info(&config);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal(serving))
        .await?;

    tracing::info!("Service shut down successfully");
    Ok(())
}

/// Builds the configured clock and makes sure its current tick fits the
/// timestamp field, so a mismatched offset fails at startup rather than on
/// every request.
fn checked_clock(config: &ServerConfig) -> anyhow::Result<Clock> {
    let clock = config.clock();
    let tick = clock.current_time();
    let max = uidgen::Layout::DEFAULT.max_timestamp();
    anyhow::ensure!(
        u64::try_from(tick).is_ok_and(|tick| tick <= max),
        "{} clock with offset {} reads {tick}, outside the timestamp range 0..={max}",
        config.clock_kind,
        config.offset,
    );
    Ok(clock)
}

fn log_startup_info(config: &ServerConfig) {
    if cfg!(debug_assertions) {
        tracing::info!(
            "Starting ID service on {} with full config: {:#?}",
            config.server_addr,
            config
        );
    } else {
        tracing::info!(
            "Starting ID service on {} (node {}, {} issuers, {} clock)",
            config.server_addr,
            config.node_id,
            config.num_issuers,
            config.clock_kind
        );
    }
}

async fn shutdown_signal(serving: Arc<AtomicBool>) {
    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C signal"),
        () = terminate => tracing::info!("Received SIGTERM signal"),
    }

    tracing::info!("Shutdown signal received, draining in-flight requests...");

    // Health checks report unavailable while axum drains connections. New
    // connections are refused from here on, so only keep-alive clients see it.
    serving.store(false, Ordering::Release);
}
