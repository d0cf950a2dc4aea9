//! Orchestrator: startup and shutdown wiring. Loads the symbol catalog,
//! computes session chunks, wires the Engine/Supervisor/writer tasks
//! together, and runs until the process receives a shutdown signal.

use std::sync::Arc;

use ingest_protocol::{CanonicalMap, Venue};
use tokio::sync::{mpsc, watch};
use tracing::{error, info};

use crate::catalog;
use crate::config::EngineConfig;
use crate::engine::{self, SessionSpec};
use crate::session::SessionKey;
use crate::sink::OutputSink;
use crate::supervisor;

pub async fn run(config: EngineConfig, shutdown: tokio::sync::watch::Receiver<bool>) {
    let canonical = Arc::new(CanonicalMap::default());
    let ledger = crate::retry::RetryLedger::new();

    let mut specs = Vec::new();
    for venue in Venue::ALL {
        let venue_config = config.venues[&venue].clone();
        let symbols = match catalog::load(&config.catalog_dir, venue) {
            Ok(symbols) => symbols,
            Err(err) => {
                error!("skipping venue {}: {}", venue, err);
                continue;
            }
        };
        catalog::warn_if_empty(venue, &symbols);

        let chunks = catalog::chunk(&symbols, venue_config.chunk_size);
        for (index, chunk_symbols) in chunks.into_iter().enumerate() {
            let key = SessionKey { venue, chunk_index: index };
            specs.push(SessionSpec { key, config: venue_config.clone(), symbols: chunk_symbols });
        }
    }

    info!("starting {} sessions across {} venues", specs.len(), Venue::ALL.len());

    let (record_tx, mut record_rx) = mpsc::unbounded_channel();
    let (reconnect_tx, reconnect_rx) = mpsc::unbounded_channel();

    crate::metrics::install(config.metrics_port);

    let mut writer_shutdown = shutdown.clone();
    let sink_output_dir = config.output_dir.clone();
    let sink_bson_dir = config.bson_dir.clone();
    let retention = config.retention;
    let writer = tokio::spawn(async move {
        let mut sink = OutputSink::new(sink_output_dir, sink_bson_dir, retention);
        loop {
            tokio::select! {
                record = record_rx.recv() => {
                    match record {
                        Some(record) => {
                            if let Err(err) = sink.append(record) {
                                error!("failed to persist record: {}", err);
                            }
                        }
                        None => break,
                    }
                }
                _ = writer_shutdown.changed() => {
                    if *writer_shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        sink.flush_all();
    });

    let supervisor_ledger = ledger.clone();
    let health_check_interval = config.health_check_interval;
    let no_data_timeout = config.no_data_timeout;
    let supervisor = tokio::spawn(async move {
        supervisor::run(supervisor_ledger, health_check_interval, no_data_timeout, reconnect_tx).await
    });

    engine::run(specs, canonical, ledger, record_tx, reconnect_rx, shutdown.clone()).await;

    info!("engine stopped, flushing output sink");
    supervisor.abort();
    if let Err(err) = writer.await {
        error!("writer task panicked: {}", err);
    }
}

/// Builds a `(tx, rx)` pair for signalling shutdown from `main`'s
/// `ctrl_c` handler into every task spawned by [`run`].
pub fn shutdown_channel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}
