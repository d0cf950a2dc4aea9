//! The Engine: a single task multiplexing every venue session through one
//! `FuturesUnordered`. Only the Engine and the Supervisor touch the Retry
//! Ledger; every other piece of per-session state (the websocket itself, its
//! subscribed symbols) lives entirely inside that session's future.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures_util::stream::{FuturesUnordered, StreamExt};
use futures_util::SinkExt;
use ingest_protocol::{CanonicalMap, Record, Venue};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{info, warn};

use crate::config::VenueConfig;
use crate::error::CollectorError;
use crate::exchanges;
use crate::gzip::{self, InflateOutcome};
use crate::metrics;
use crate::retry::RetryLedger;
use crate::session::{SessionKey, SessionState};
use crate::subscribe;

/// Shared session-state table, read by nothing outside this module today but
/// updated at every transition in `drive_session` so it always reflects the
/// connect → subscribe → live → backoff cycle for whatever introspects it
/// next (logs, a future metrics gauge, a debug endpoint).
pub type SessionStates = Arc<DashMap<SessionKey, SessionState>>;

pub struct SessionSpec {
    pub key: SessionKey,
    pub config: VenueConfig,
    pub symbols: Vec<String>,
}

/// Outcome of one connect-subscribe-read lifecycle; always returned, never
/// propagated as an error, since a single session dying must never bring
/// down the others.
struct SessionEnded {
    key: SessionKey,
}

type SessionFuture = Pin<Box<dyn Future<Output = SessionEnded> + Send>>;

pub async fn run(
    specs: Vec<SessionSpec>,
    canonical: Arc<CanonicalMap>,
    ledger: RetryLedger,
    record_tx: mpsc::UnboundedSender<Record>,
    mut reconnect_rx: mpsc::UnboundedReceiver<SessionKey>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut configs: HashMap<SessionKey, (VenueConfig, Vec<String>)> = HashMap::new();
    let mut force_reconnect: HashMap<SessionKey, watch::Sender<bool>> = HashMap::new();
    let mut in_flight: FuturesUnordered<SessionFuture> = FuturesUnordered::new();
    let states: SessionStates = Arc::new(DashMap::new());

    for spec in specs {
        states.insert(spec.key, SessionState::Idle);
        let (force_tx, force_rx) = watch::channel(false);
        force_reconnect.insert(spec.key, force_tx);
        configs.insert(spec.key, (spec.config.clone(), spec.symbols.clone()));
        let fut: SessionFuture = Box::pin(drive_session(
            spec.key,
            spec.config,
            spec.symbols,
            canonical.clone(),
            ledger.clone(),
            record_tx.clone(),
            force_rx,
            states.clone(),
        ));
        in_flight.push(fut);
    }

    loop {
        tokio::select! {
            biased;

            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    info!("engine shutting down, dropping {} in-flight sessions", in_flight.len());
                    return;
                }
            }

            Some(key) = reconnect_rx.recv() => {
                if let Some(sender) = force_reconnect.get(&key) {
                    let _ = sender.send(true);
                }
            }

            Some(ended) = in_flight.next() => {
                let SessionEnded { key } = ended;
                let Some((config, symbols)) = configs.get(&key).cloned() else { continue };
                metrics::record_session_ended();
                let backoff = ledger.record_failure(key, config.max_backoff_secs);
                warn!("session {} ended, reconnecting in {}s", key, backoff);
                states.insert(key, SessionState::Backoff);

                let (force_tx, force_rx) = watch::channel(false);
                force_reconnect.insert(key, force_tx);
                let canonical = canonical.clone();
                let ledger = ledger.clone();
                let record_tx = record_tx.clone();
                let states = states.clone();
                let fut: SessionFuture = Box::pin(async move {
                    tokio::time::sleep(Duration::from_secs(backoff)).await;
                    drive_session(key, config, symbols, canonical, ledger, record_tx, force_rx, states).await
                });
                in_flight.push(fut);
            }
        }
    }
}

async fn drive_session(
    key: SessionKey,
    config: VenueConfig,
    symbols: Vec<String>,
    canonical: Arc<CanonicalMap>,
    ledger: RetryLedger,
    record_tx: mpsc::UnboundedSender<Record>,
    mut force_reconnect: watch::Receiver<bool>,
    states: SessionStates,
) -> SessionEnded {
    states.insert(key, SessionState::Connecting);
    let (mut ws, _response) = match connect_async(&config.ws_url).await {
        Ok(pair) => pair,
        Err(source) => {
            let error = CollectorError::Transport { venue: key.venue.tag(), source };
            warn!("session {} failed to connect: {}", key, error);
            states.insert(key, SessionState::Backoff);
            return SessionEnded { key };
        }
    };

    if !config.pre_connect_delay.is_zero() {
        tokio::time::sleep(config.pre_connect_delay).await;
    }

    states.insert(key, SessionState::Subscribing);
    for frame in subscribe::build(key.venue, &symbols) {
        if let Err(source) = ws.send(Message::Text(frame)).await {
            let error = CollectorError::SubscriptionSend { venue: key.venue.tag(), source };
            warn!("session {}: {}", key, error);
            states.insert(key, SessionState::Backoff);
            return SessionEnded { key };
        }
    }

    ledger.record_success(key);
    metrics::record_session_started();
    states.insert(key, SessionState::Live);
    info!("session {} live with {} symbols", key, symbols.len());

    let session_symbol = symbols.first().cloned().unwrap_or_default();
    let venue_tag = key.venue.tag();

    loop {
        tokio::select! {
            _ = force_reconnect.changed() => {
                if *force_reconnect.borrow() {
                    info!("session {} forced to reconnect by supervisor", key);
                    return SessionEnded { key };
                }
            }

            frame = ws.next() => {
                let Some(frame) = frame else {
                    info!("session {} socket closed", key);
                    return SessionEnded { key };
                };
                let frame = match frame {
                    Ok(frame) => frame,
                    Err(source) => {
                        let error = CollectorError::Transport { venue: key.venue.tag(), source };
                        warn!("session {}: {}", key, error);
                        return SessionEnded { key };
                    }
                };

                ledger.touch(key, unix_millis());

                match frame {
                    Message::Text(text) => {
                        handle_text(key.venue, &text, &canonical, &session_symbol, &record_tx, &mut ws).await;
                    }
                    Message::Binary(bytes) => {
                        if !config.needs_gzip {
                            metrics::record_frame_dropped(venue_tag, "unexpected-binary");
                            continue;
                        }
                        match gzip::inflate(&bytes) {
                            InflateOutcome::Inflated(plain) => {
                                if let Ok(text) = String::from_utf8(plain) {
                                    handle_text(key.venue, &text, &canonical, &session_symbol, &record_tx, &mut ws).await;
                                } else {
                                    metrics::record_frame_dropped(venue_tag, "non-utf8");
                                }
                            }
                            InflateOutcome::Overflow => metrics::record_frame_dropped(venue_tag, "gzip-overflow"),
                            InflateOutcome::Error(source) => {
                                let error = CollectorError::GzipInflate(source);
                                warn!("session {}: {}", key, error);
                                metrics::record_frame_dropped(venue_tag, "gzip-error");
                            }
                        }
                    }
                    Message::Ping(payload) => {
                        let _ = ws.send(Message::Pong(payload)).await;
                    }
                    Message::Close(_) => {
                        info!("session {} received close frame", key);
                        return SessionEnded { key };
                    }
                    _ => {}
                }
            }
        }
    }
}

async fn handle_text(
    venue: Venue,
    text: &str,
    canonical: &CanonicalMap,
    session_symbol: &str,
    record_tx: &mpsc::UnboundedSender<Record>,
    ws: &mut tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
) {
    let venue_tag = venue.tag();
    match exchanges::dispatch(venue, text, canonical, session_symbol) {
        exchanges::ParseOutcome::Record(record) => {
            metrics::record_frame_parsed(venue_tag, record.kind().as_str());
            let _ = record_tx.send(record);
        }
        exchanges::ParseOutcome::Control => {}
        exchanges::ParseOutcome::Pong(reply) => {
            let _ = ws.send(Message::Text(reply)).await;
        }
        exchanges::ParseOutcome::Unrecognized => {
            metrics::record_frame_dropped(venue_tag, "unrecognized");
        }
    }
}

fn unix_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
