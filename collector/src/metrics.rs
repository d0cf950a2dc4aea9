//! Prometheus exporter for the ambient observability surface. Disabled
//! entirely when the configured port is `0`.

use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{info, warn};

pub fn install(port: u16) {
    if port == 0 {
        info!("metrics endpoint disabled (port=0)");
        return;
    }
    let addr: std::net::SocketAddr = ([127, 0, 0, 1], port).into();
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => info!("metrics endpoint listening on http://{}/metrics", addr),
        Err(err) => warn!("failed to start metrics endpoint on {}: {}", addr, err),
    }
}

pub fn record_session_started() {
    metrics::gauge!("collector_active_sessions").increment(1.0);
}

pub fn record_session_ended() {
    metrics::gauge!("collector_active_sessions").decrement(1.0);
}

pub fn record_reconnect(venue: &'static str) {
    metrics::counter!("collector_reconnects_total", "venue" => venue).increment(1);
}

pub fn record_frame_parsed(venue: &'static str, kind: &'static str) {
    metrics::counter!("collector_frames_parsed_total", "venue" => venue, "kind" => kind).increment(1);
}

pub fn record_frame_dropped(venue: &'static str, reason: &'static str) {
    metrics::counter!("collector_frames_dropped_total", "venue" => venue, "reason" => reason).increment(1);
}

pub fn record_stall_detected(venue: &'static str) {
    metrics::counter!("collector_stall_detected_total", "venue" => venue).increment(1);
}
