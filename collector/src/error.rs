use thiserror::Error;

/// The failure taxonomy of the ingestion engine. Every variant here is
/// something a single session or a single record can fail at without taking
/// down the process; nothing here is fatal to the whole engine except
/// failing to construct it in the first place.
#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("transport error on {venue}: {source}")]
    Transport {
        venue: &'static str,
        #[source]
        source: tokio_tungstenite::tungstenite::Error,
    },

    #[error("malformed frame from {venue}: {reason}")]
    MalformedFrame { venue: &'static str, reason: String },

    #[error("failed to send subscription to {venue}: {source}")]
    SubscriptionSend {
        venue: &'static str,
        #[source]
        source: tokio_tungstenite::tungstenite::Error,
    },

    #[error("output I/O failure for {path}: {source}")]
    OutputIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load symbol catalog for {venue}: {source}")]
    CatalogLoad {
        venue: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed symbol catalog for {venue}: {source}")]
    CatalogParse {
        venue: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("gzip inflate failed: {0}")]
    GzipInflate(#[from] std::io::Error),
}
