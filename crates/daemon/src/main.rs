//! PhotoQueue Daemon - Main Entry Point
//! Wires the command processor, ledger exporter and JSON-RPC server

mod config;

use anyhow::{Context, Result};
use config::{DaemonConfig, LogFormat};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Import workspace crates
use photoqueue_api_rpc::RpcServer;
use photoqueue_core::application::{
    ledger_channel, shutdown_channel, CommandProcessor, RetryPolicy,
};
use photoqueue_core::config::RetrySettings;
use photoqueue_core::port::{
    AllowAllAuthorizer, Authorizer, InMemoryPricing, LedgerSink, StaticTokenAuthorizer,
    SystemTimeProvider, TracingLedgerSink, UuidProvider,
};
use photoqueue_infra_ledger::JsonlLedgerSink;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const LEDGER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

fn init_logging(format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("photoqueue=info"))
        .context("Failed to create env filter")?;

    match format {
        LogFormat::Json => {
            // Production: JSON structured logging
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        LogFormat::Pretty => {
            // Development: Pretty formatting with colors
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration (fails fast on bad values)
    let config = DaemonConfig::from_env()?;

    // 2. Initialize logging
    init_logging(config.log_format)?;
    info!("PhotoQueue daemon v{} starting...", VERSION);

    // 3. Ledger sink
    let ledger_sink: Arc<dyn LedgerSink> = match &config.ledger_path {
        Some(path) => Arc::new(
            JsonlLedgerSink::open(path)
                .await
                .with_context(|| format!("Failed to open ledger {}", path.display()))?,
        ),
        None => {
            info!("PHOTOQUEUE_LEDGER_PATH not set; completed entries are only logged");
            Arc::new(TracingLedgerSink)
        }
    };
    let (ledger_handle, ledger_exporter) =
        ledger_channel(ledger_sink, RetryPolicy::new(RetrySettings::default()));

    // 4. Setup dependencies (DI wiring)
    let processor = Arc::new(
        CommandProcessor::new(
            &config.engine,
            Arc::new(InMemoryPricing::new(config.unit_price)),
            Arc::new(UuidProvider),
            Arc::new(SystemTimeProvider),
        )?
        .with_ledger(ledger_handle),
    );

    let authorizer: Arc<dyn Authorizer> = if config.auth.disabled {
        warn!("Authorization disabled: every caller has elevated rights");
        Arc::new(AllowAllAuthorizer)
    } else {
        Arc::new(StaticTokenAuthorizer::new(
            config.auth.operator_tokens.clone(),
            config.auth.admin_tokens.clone(),
        ))
    };

    // 5. Start ledger exporter
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let exporter_handle = tokio::spawn(ledger_exporter.run(shutdown_rx));

    // 6. Start JSON-RPC server
    let rpc_server = RpcServer::new(config.rpc.clone(), processor.clone(), authorizer);
    let (rpc_addr, rpc_handle) = rpc_server
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    let snapshot = processor.snapshot();
    info!(
        addr = %rpc_addr,
        status = %snapshot.status,
        location = %snapshot.location,
        unit_price = snapshot.unit_price,
        broadcast_capacity = processor.broadcaster().capacity(),
        "System ready. Press Ctrl+C to shutdown"
    );

    // 7. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    // 8. Graceful shutdown: stop taking commands, then flush the ledger
    rpc_handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;
    rpc_handle.stopped().await;

    shutdown_tx.shutdown();
    if tokio::time::timeout(LEDGER_DRAIN_TIMEOUT, exporter_handle)
        .await
        .is_err()
    {
        warn!("Ledger exporter did not finish in time; pending exports dropped");
    }

    info!("Shutdown complete.");

    Ok(())
}
