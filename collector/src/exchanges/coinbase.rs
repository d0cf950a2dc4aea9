//! Coinbase Exchange parser. Ticker and trade frames share one flat JSON
//! shape discriminated by `type`.

use ingest_protocol::{timestamp, CanonicalMap, Record, TickerRecord, TradeRecord};
use serde::Deserialize;

use super::ParseOutcome;

#[derive(Debug, Deserialize)]
struct Frame {
    r#type: String,
    #[serde(default)]
    product_id: Option<String>,
    #[serde(default)]
    price: Option<String>,
    #[serde(default)]
    best_bid: Option<String>,
    #[serde(default)]
    best_bid_size: Option<String>,
    #[serde(default)]
    best_ask: Option<String>,
    #[serde(default)]
    best_ask_size: Option<String>,
    #[serde(default)]
    open_24h: Option<String>,
    #[serde(default)]
    high_24h: Option<String>,
    #[serde(default)]
    low_24h: Option<String>,
    #[serde(default)]
    volume_24h: Option<String>,
    #[serde(default)]
    volume_30d: Option<String>,
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    trade_id: Option<u64>,
    #[serde(default)]
    maker_order_id: Option<String>,
    #[serde(default)]
    last_size: Option<String>,
}

pub fn parse(frame: &str, symbols: &CanonicalMap) -> ParseOutcome {
    let Ok(msg) = serde_json::from_str::<Frame>(frame) else {
        return ParseOutcome::Unrecognized;
    };

    let product_id = match &msg.product_id {
        Some(id) => id.clone(),
        None => return ParseOutcome::Control,
    };
    let symbol = symbols.resolve(&product_id);
    let ts = msg.time.as_deref().map(timestamp::normalize_timestamp).unwrap_or_default();

    match msg.r#type.as_str() {
        "ticker" => {
            let Some(price) = msg.price.clone() else { return ParseOutcome::Unrecognized };
            let mut record = TickerRecord::new("Coinbase", symbol, price.clone(), ts);
            record.bid = msg.best_bid;
            record.bid_qty = msg.best_bid_size;
            record.ask = msg.best_ask;
            record.ask_qty = msg.best_ask_size;
            record.open_24h = msg.open_24h;
            record.high_24h = msg.high_24h;
            record.low_24h = msg.low_24h;
            record.volume_24h = msg.volume_24h;
            record.volume_30d = msg.volume_30d;
            record.last_trade_id = msg.trade_id.map(|id| id.to_string());
            record.last_trade_price = Some(price);
            record.last_trade_size = msg.last_size;
            ParseOutcome::Record(Record::Ticker(record))
        }
        "match" => {
            let (Some(price), Some(size), Some(trade_id)) = (msg.price, msg.size, msg.trade_id) else {
                return ParseOutcome::Unrecognized;
            };
            let record = TradeRecord::new("Coinbase", symbol, price, size, trade_id.to_string(), ts);
            let mut record = record;
            record.market_maker = Some(msg.maker_order_id.is_some());
            ParseOutcome::Record(Record::Trade(record))
        }
        _ => ParseOutcome::Control,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ticker_frame() {
        let frame = r#"{"type":"ticker","product_id":"BTC-USD","price":"35000.00","best_bid":"34999.00","best_ask":"35001.00","open_24h":"34500.00","high_24h":"35500.00","low_24h":"34000.00","volume_24h":"1000.0","time":"2023-11-14T22:13:20.001Z","trade_id":987,"last_size":"0.015"}"#;
        let map = CanonicalMap::default();
        match parse(frame, &map) {
            ParseOutcome::Record(Record::Ticker(t)) => {
                assert_eq!(t.symbol, "BTC-USD");
                assert_eq!(t.timestamp, "2023-11-14 22:13:20.001000 UTC");
                assert_eq!(t.last_trade_id.as_deref(), Some("987"));
                assert_eq!(t.last_trade_size.as_deref(), Some("0.015"));
                assert_eq!(t.last_trade_price.as_deref(), Some("35000.00"));
            }
            other => panic!("expected ticker, got {other:?}"),
        }
    }

    #[test]
    fn parses_match_frame() {
        let frame = r#"{"type":"match","product_id":"BTC-USD","price":"35000.50","size":"0.02","trade_id":555,"time":"2023-11-14T22:13:20.001Z","maker_order_id":"abc"}"#;
        let map = CanonicalMap::default();
        match parse(frame, &map) {
            ParseOutcome::Record(Record::Trade(t)) => {
                assert_eq!(t.trade_id, "555");
                assert_eq!(t.market_maker, Some(true));
            }
            other => panic!("expected trade, got {other:?}"),
        }
    }

    #[test]
    fn subscription_ack_is_control() {
        let frame = r#"{"type":"subscriptions","channels":[]}"#;
        let map = CanonicalMap::default();
        assert_eq!(parse(frame, &map), ParseOutcome::Control);
    }

    #[test]
    fn last_match_on_subscribe_emits_nothing() {
        let frame = r#"{"type":"last_match","product_id":"BTC-USD","price":"35000.50","size":"0.02","trade_id":555,"time":"2023-11-14T22:13:20.001Z"}"#;
        let map = CanonicalMap::default();
        assert_eq!(parse(frame, &map), ParseOutcome::Control);
    }
}
