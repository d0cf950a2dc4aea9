use anyhow::Result;
use tokio::signal;
use tracing::info;

use ingest_collector::{orchestrator, EngineConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ingest_collector=info".parse()?)
                .add_directive("info".parse()?),
        )
        .init();

    info!("starting market-data ingestion collector");

    let config = match std::env::var("COLLECTOR_CONFIG") {
        Ok(path) => EngineConfig::load_with_overrides(&path),
        Err(_) => EngineConfig::default(),
    };

    let (shutdown_tx, shutdown_rx) = orchestrator::shutdown_channel();

    let orchestrator_handle = tokio::spawn(orchestrator::run(config, shutdown_rx));

    signal::ctrl_c().await?;
    info!("received shutdown signal, draining sessions");
    let _ = shutdown_tx.send(true);

    if let Err(err) = orchestrator_handle.await {
        tracing::error!("orchestrator task panicked during shutdown: {}", err);
    }

    info!("collector shut down cleanly");
    Ok(())
}
