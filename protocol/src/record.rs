//! Canonical record types. Every venue's Frame Parser normalizes into one of
//! these two shapes; both are immutable once built and carry their own
//! normalized timestamp so the Output Sink never has to reach back into a
//! venue-specific payload.

use serde::{Deserialize, Serialize};

/// Discriminates which rolling buffer / BSON partition a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Ticker,
    Trade,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Ticker => "ticker",
            RecordKind::Trade => "trade",
        }
    }
}

/// A flat bundle of stringified numeric fields describing the current state
/// of a venue's order book top-of-book plus its 24h/30d statistics. All
/// fields are optional except `exchange`, `symbol`, `price`, `timestamp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerRecord {
    pub exchange: String,
    pub symbol: String,
    pub price: String,
    pub timestamp: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bid_qty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ask: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ask_qty: Option<String>,

    /// Kraken's "whole lot" component of the bid quote, absent elsewhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bid_whole: Option<String>,
    /// Kraken's "whole lot" component of the ask quote, absent elsewhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ask_whole: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_24h: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_24h: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_24h: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_24h: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_24h: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_30d: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_volume: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_trade_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_trade_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_trade_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_trade_time: Option<String>,
}

impl TickerRecord {
    pub fn new(exchange: &str, symbol: impl Into<String>, price: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            exchange: exchange.to_string(),
            symbol: symbol.into(),
            price: price.into(),
            timestamp: timestamp.into(),
            bid: None,
            bid_qty: None,
            ask: None,
            ask_qty: None,
            bid_whole: None,
            ask_whole: None,
            open_24h: None,
            high_24h: None,
            low_24h: None,
            close_24h: None,
            volume_24h: None,
            volume_30d: None,
            quote_volume: None,
            last_trade_id: None,
            last_trade_price: None,
            last_trade_size: None,
            last_trade_time: None,
        }
    }
}

/// A single executed trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub exchange: String,
    pub symbol: String,
    pub price: String,
    pub size: String,
    pub trade_id: String,
    pub timestamp: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_maker: Option<bool>,
}

impl TradeRecord {
    pub fn new(
        exchange: &str,
        symbol: impl Into<String>,
        price: impl Into<String>,
        size: impl Into<String>,
        trade_id: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            exchange: exchange.to_string(),
            symbol: symbol.into(),
            price: price.into(),
            size: size.into(),
            trade_id: trade_id.into(),
            timestamp: timestamp.into(),
            market_maker: None,
        }
    }
}

/// Either canonical record kind, for code paths (the sink, the engine) that
/// handle both uniformly. Serializes untagged so a rolling JSON file of
/// tickers reads as a plain array of ticker objects, not `{"Ticker": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Record {
    Ticker(TickerRecord),
    Trade(TradeRecord),
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Ticker(_) => RecordKind::Ticker,
            Record::Trade(_) => RecordKind::Trade,
        }
    }

    pub fn exchange(&self) -> &str {
        match self {
            Record::Ticker(t) => &t.exchange,
            Record::Trade(t) => &t.exchange,
        }
    }

    pub fn timestamp(&self) -> &str {
        match self {
            Record::Ticker(t) => &t.timestamp,
            Record::Trade(t) => &t.timestamp,
        }
    }

    /// Serialize to a BSON document for the append-only binary-document file.
    pub fn to_bson_document(&self) -> Result<bson::Document, crate::error::ProtocolError> {
        let doc = match self {
            Record::Ticker(t) => bson::to_document(t)?,
            Record::Trade(t) => bson::to_document(t)?,
        };
        Ok(doc)
    }
}
