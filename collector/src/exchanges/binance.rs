//! Binance.us combined-stream parser. Every frame is wrapped in
//! `{"stream": "...", "data": {...}}`; `data.e` discriminates ticker vs
//! trade.

use ingest_protocol::{timestamp, CanonicalMap, Record, TickerRecord, TradeRecord};
use serde::Deserialize;

use super::ParseOutcome;

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    stream: Option<String>,
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct TickerPayload {
    e: String,
    s: String,
    #[serde(rename = "E")]
    event_time: i64,
    c: String,
    #[serde(default)]
    b: Option<String>,
    #[serde(rename = "B", default)]
    bid_qty: Option<String>,
    #[serde(default)]
    a: Option<String>,
    #[serde(rename = "A", default)]
    ask_qty: Option<String>,
    #[serde(default)]
    o: Option<String>,
    #[serde(default)]
    h: Option<String>,
    #[serde(default)]
    l: Option<String>,
    #[serde(default)]
    v: Option<String>,
    #[serde(default)]
    q: Option<String>,
    #[serde(default)]
    t: Option<u64>,
    #[serde(default)]
    p: Option<String>,
    #[serde(rename = "C", default)]
    close_24h: Option<String>,
    #[serde(rename = "S", default)]
    last_trade_size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TradePayload {
    e: String,
    s: String,
    t: u64,
    p: String,
    q: String,
    #[serde(rename = "T")]
    trade_time: i64,
    m: bool,
}

pub fn parse(frame: &str, symbols: &CanonicalMap) -> ParseOutcome {
    let Ok(envelope) = serde_json::from_str::<Envelope>(frame) else {
        return ParseOutcome::Unrecognized;
    };
    let _ = &envelope.stream;

    if let Ok(ticker) = serde_json::from_value::<TickerPayload>(envelope.data.clone()) {
        if ticker.e == "24hrTicker" {
            let mut record = TickerRecord::new(
                "Binance",
                symbols.resolve(&ticker.s),
                ticker.c,
                timestamp::normalize_epoch_millis(ticker.event_time),
            );
            record.bid = ticker.b;
            record.bid_qty = ticker.bid_qty;
            record.ask = ticker.a;
            record.ask_qty = ticker.ask_qty;
            record.open_24h = ticker.o;
            record.high_24h = ticker.h;
            record.low_24h = ticker.l;
            record.volume_24h = ticker.v;
            record.quote_volume = ticker.q;
            record.close_24h = ticker.close_24h;
            record.last_trade_id = ticker.t.map(|id| id.to_string());
            record.last_trade_price = ticker.p;
            record.last_trade_size = ticker.last_trade_size;
            return ParseOutcome::Record(Record::Ticker(record));
        }
    }

    if let Ok(trade) = serde_json::from_value::<TradePayload>(envelope.data.clone()) {
        if trade.e == "trade" {
            let record = TradeRecord::new(
                "Binance",
                symbols.resolve(&trade.s),
                trade.p,
                trade.q,
                trade.t.to_string(),
                timestamp::normalize_epoch_millis(trade.trade_time),
            );
            let mut record = record;
            record.market_maker = Some(trade.m);
            return ParseOutcome::Record(Record::Trade(record));
        }
    }

    ParseOutcome::Control
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ticker_frame() {
        let frame = r#"{"stream":"btcusdt@ticker","data":{"e":"24hrTicker","E":1700000000000,"s":"BTCUSDT","p":"10","P":"0.1","c":"35000.00","b":"34999.00","B":"1.0","a":"35001.00","A":"1.0","o":"34500.00","h":"35500.00","l":"34000.00","v":"1000.0","q":"35000000.0"}}"#;
        let map = CanonicalMap::default();
        match parse(frame, &map) {
            ParseOutcome::Record(Record::Ticker(t)) => {
                assert_eq!(t.symbol, "BTC-USD");
                assert_eq!(t.price, "35000.00");
                assert_eq!(t.bid.as_deref(), Some("34999.00"));
            }
            other => panic!("expected ticker record, got {other:?}"),
        }
    }

    #[test]
    fn minimal_ticker_frame_with_only_required_fields_still_emits_a_record() {
        let frame = r#"{"stream":"btcusdt@ticker","data":{"e":"24hrTicker","E":1700000000000,"s":"BTCUSDT","c":"35000.00"}}"#;
        let map = CanonicalMap::default();
        match parse(frame, &map) {
            ParseOutcome::Record(Record::Ticker(t)) => {
                assert_eq!(t.symbol, "BTC-USD");
                assert_eq!(t.price, "35000.00");
                assert_eq!(t.bid, None);
            }
            other => panic!("expected ticker record, got {other:?}"),
        }
    }

    #[test]
    fn parses_trade_frame() {
        let frame = r#"{"stream":"btcusdt@trade","data":{"e":"trade","E":1700000000000,"s":"BTCUSDT","t":12345,"p":"35000.50","q":"0.01","T":1700000000100,"m":true}}"#;
        let map = CanonicalMap::default();
        match parse(frame, &map) {
            ParseOutcome::Record(Record::Trade(t)) => {
                assert_eq!(t.trade_id, "12345");
                assert_eq!(t.market_maker, Some(true));
            }
            other => panic!("expected trade record, got {other:?}"),
        }
    }

    #[test]
    fn unparseable_frame_is_unrecognized() {
        let map = CanonicalMap::default();
        assert_eq!(parse("not json", &map), ParseOutcome::Unrecognized);
    }
}
