//! Per-venue configuration: WebSocket URL, chunk size, gzip requirement,
//! pre-connect delay and backoff cap. These are configuration, not hardcoded
//! constants — built-in defaults match each venue's real endpoint and
//! subscription quota, and an optional TOML file can override any field.

use std::collections::HashMap;
use std::time::Duration;

use ingest_protocol::Venue;
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct VenueConfig {
    pub venue: Venue,
    pub ws_url: String,
    pub chunk_size: usize,
    pub needs_gzip: bool,
    pub pre_connect_delay: Duration,
    pub max_backoff_secs: u64,
}

impl VenueConfig {
    fn defaults_for(venue: Venue) -> Self {
        match venue {
            Venue::Binance => VenueConfig {
                venue,
                ws_url: "wss://stream.binance.us:9443/stream".to_string(),
                chunk_size: 100,
                needs_gzip: false,
                pre_connect_delay: Duration::ZERO,
                max_backoff_secs: 10,
            },
            Venue::Coinbase => VenueConfig {
                venue,
                ws_url: "wss://ws-feed.exchange.coinbase.com".to_string(),
                chunk_size: 100,
                needs_gzip: false,
                pre_connect_delay: Duration::ZERO,
                max_backoff_secs: 10,
            },
            Venue::Kraken => VenueConfig {
                venue,
                ws_url: "wss://ws.kraken.com".to_string(),
                chunk_size: 100,
                needs_gzip: false,
                pre_connect_delay: Duration::from_millis(200),
                max_backoff_secs: 10,
            },
            Venue::Bitfinex => VenueConfig {
                venue,
                ws_url: "wss://api-pub.bitfinex.com/ws/2".to_string(),
                chunk_size: 1,
                needs_gzip: false,
                pre_connect_delay: Duration::ZERO,
                max_backoff_secs: 10,
            },
            Venue::Huobi => VenueConfig {
                venue,
                ws_url: "wss://api.huobi.pro/ws".to_string(),
                chunk_size: 1,
                needs_gzip: true,
                pre_connect_delay: Duration::ZERO,
                max_backoff_secs: 10,
            },
            Venue::Okx => VenueConfig {
                venue,
                ws_url: "wss://ws.okx.com:8443/ws/v5/public".to_string(),
                chunk_size: 100,
                needs_gzip: false,
                pre_connect_delay: Duration::ZERO,
                max_backoff_secs: 10,
            },
        }
    }
}

/// The full per-venue table, optionally overridden from a TOML file.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub venues: HashMap<Venue, VenueConfig>,
    pub catalog_dir: String,
    pub output_dir: String,
    pub bson_dir: String,
    pub retention: Duration,
    pub health_check_interval: Duration,
    pub no_data_timeout: Duration,
    pub metrics_port: u16,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let venues = Venue::ALL
            .iter()
            .map(|&v| (v, VenueConfig::defaults_for(v)))
            .collect();
        EngineConfig {
            venues,
            catalog_dir: "currency_text_files".to_string(),
            output_dir: ".".to_string(),
            bson_dir: "bson_output".to_string(),
            retention: Duration::from_secs(600),
            health_check_interval: Duration::from_secs(30),
            no_data_timeout: Duration::from_secs(60),
            metrics_port: 9090,
        }
    }
}

/// Shape of the optional TOML override file. Every field is optional; a row
/// that omits a field keeps that venue's default for it.
#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    catalog_dir: Option<String>,
    #[serde(default)]
    output_dir: Option<String>,
    #[serde(default)]
    bson_dir: Option<String>,
    #[serde(default)]
    metrics_port: Option<u16>,
    #[serde(default)]
    venue: HashMap<String, VenueOverride>,
}

#[derive(Debug, Deserialize, Default)]
struct VenueOverride {
    ws_url: Option<String>,
    chunk_size: Option<usize>,
    needs_gzip: Option<bool>,
    pre_connect_delay_ms: Option<u64>,
    max_backoff_secs: Option<u64>,
}

impl EngineConfig {
    /// Load overrides from `path`, falling back to defaults for the whole
    /// file (not just the affected venue) if it can't be read or parsed — a
    /// malformed config file must not prevent startup.
    pub fn load_with_overrides(path: &str) -> Self {
        let mut config = EngineConfig::default();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                warn!("could not read config file {}: {} — using defaults", path, err);
                return config;
            }
        };
        let file: ConfigFile = match toml::from_str(&text) {
            Ok(file) => file,
            Err(err) => {
                warn!("malformed config file {}: {} — using defaults", path, err);
                return config;
            }
        };

        if let Some(dir) = file.catalog_dir {
            config.catalog_dir = dir;
        }
        if let Some(dir) = file.output_dir {
            config.output_dir = dir;
        }
        if let Some(dir) = file.bson_dir {
            config.bson_dir = dir;
        }
        if let Some(port) = file.metrics_port {
            config.metrics_port = port;
        }

        for (tag, over) in file.venue {
            let Some(venue) = Venue::ALL.into_iter().find(|v| v.tag() == tag) else {
                warn!("config file names unknown venue '{}' — ignoring", tag);
                continue;
            };
            let entry = config.venues.get_mut(&venue).expect("every venue has a default row");
            if let Some(url) = over.ws_url {
                match url::Url::parse(&url) {
                    Ok(_) => entry.ws_url = url,
                    Err(err) => warn!("invalid ws_url override for {}: {} — keeping default", tag, err),
                }
            }
            if let Some(size) = over.chunk_size {
                entry.chunk_size = size;
            }
            if let Some(gzip) = over.needs_gzip {
                entry.needs_gzip = gzip;
            }
            if let Some(ms) = over.pre_connect_delay_ms {
                entry.pre_connect_delay = Duration::from_millis(ms);
            }
            if let Some(secs) = over.max_backoff_secs {
                entry.max_backoff_secs = secs;
            }
        }

        config
    }
}
