//! Huobi parser. Frames arrive gzip-compressed (handled upstream by the
//! inflator) and JSON-encoded; `ping`/`pong` keepalive frames must be
//! answered with the same millisecond value or the venue drops the socket.

use ingest_protocol::{timestamp, CanonicalMap, Record, TickerRecord, TradeRecord};
use serde::Deserialize;
use serde_json::Value;

use super::ParseOutcome;

#[derive(Debug, Deserialize)]
struct PingFrame {
    ping: i64,
}

#[derive(Debug, Deserialize)]
struct DataFrame {
    ch: String,
    #[serde(default)]
    ts: i64,
    tick: Value,
}

pub fn parse(frame: &str, symbols: &CanonicalMap) -> ParseOutcome {
    if let Ok(ping) = serde_json::from_str::<PingFrame>(frame) {
        return ParseOutcome::Pong(format!(r#"{{"pong":{}}}"#, ping.ping));
    }

    let Ok(data) = serde_json::from_str::<DataFrame>(frame) else {
        return ParseOutcome::Unrecognized;
    };

    let Some(market_token) = channel_symbol(&data.ch) else {
        return ParseOutcome::Control;
    };
    let symbol = symbols.resolve(&market_token);
    let now = timestamp::normalize_epoch_millis(data.ts);

    if data.ch.ends_with(".ticker") {
        return parse_ticker(&data.tick, symbol, now);
    }
    if data.ch.ends_with(".trade.detail") {
        return parse_trade(&data.tick, symbol);
    }
    ParseOutcome::Control
}

/// `market.btcusdt.detail` / `market.btcusdt.trade.detail` -> `btcusdt`.
fn channel_symbol(ch: &str) -> Option<String> {
    ch.strip_prefix("market.")
        .and_then(|rest| rest.split('.').next())
        .map(str::to_string)
}

fn parse_ticker(tick: &Value, symbol: String, now: String) -> ParseOutcome {
    let num = |key: &str| tick.get(key).and_then(Value::as_f64).map(|v| v.to_string());
    let str_field = |key: &str| tick.get(key).and_then(Value::as_str).map(str::to_string);
    let Some(close) = num("close") else { return ParseOutcome::Unrecognized };
    let mut record = TickerRecord::new("Huobi", symbol, close, now);
    record.open_24h = num("open");
    record.high_24h = num("high");
    record.low_24h = num("low");
    record.volume_24h = num("vol");
    record.bid = str_field("bid").or_else(|| num("bid"));
    record.bid_qty = str_field("bidSize").or_else(|| num("bidSize"));
    record.ask = str_field("ask").or_else(|| num("ask"));
    record.ask_qty = str_field("askSize").or_else(|| num("askSize"));
    ParseOutcome::Record(Record::Ticker(record))
}

fn parse_trade(tick: &Value, symbol: String) -> ParseOutcome {
    let Some(Value::Array(trades)) = tick.get("data") else { return ParseOutcome::Unrecognized };
    let Some(first) = trades.first() else { return ParseOutcome::Unrecognized };
    let id = first.get("id").and_then(Value::as_i64);
    let price = first.get("price").and_then(Value::as_f64);
    let amount = first.get("amount").and_then(Value::as_f64);
    let ts = first.get("ts").and_then(Value::as_i64);
    let (Some(id), Some(price), Some(amount), Some(ts)) = (id, price, amount, ts) else {
        return ParseOutcome::Unrecognized;
    };
    let record = TradeRecord::new(
        "Huobi",
        symbol,
        price.to_string(),
        amount.to_string(),
        id.to_string(),
        timestamp::normalize_epoch_millis(ts),
    );
    ParseOutcome::Record(Record::Trade(record))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_gets_matching_pong() {
        let map = CanonicalMap::default();
        match parse(r#"{"ping":1700000000000}"#, &map) {
            ParseOutcome::Pong(reply) => assert_eq!(reply, r#"{"pong":1700000000000}"#),
            other => panic!("expected pong, got {other:?}"),
        }
    }

    #[test]
    fn parses_ticker_channel() {
        let frame = r#"{"ch":"market.btcusdt.ticker","ts":1700000000000,"tick":{"open":34500.0,"close":35000.0,"high":35500.0,"low":34000.0,"amount":1000.0,"vol":35000000.0,"bid":"34999.0","bidSize":"1.2","ask":"35001.0","askSize":"0.8","count":500}}"#;
        let map = CanonicalMap::default();
        match parse(frame, &map) {
            ParseOutcome::Record(Record::Ticker(t)) => {
                assert_eq!(t.symbol, "BTC-USD");
                assert_eq!(t.price, "35000");
                assert_eq!(t.bid.as_deref(), Some("34999.0"));
                assert_eq!(t.ask_qty.as_deref(), Some("0.8"));
            }
            other => panic!("expected ticker, got {other:?}"),
        }
    }

    #[test]
    fn detail_channel_is_no_longer_treated_as_ticker() {
        let frame = r#"{"ch":"market.btcusdt.detail","ts":1700000000000,"tick":{"open":34500.0,"close":35000.0}}"#;
        let map = CanonicalMap::default();
        assert_eq!(parse(frame, &map), ParseOutcome::Control);
    }

    #[test]
    fn parses_trade_detail() {
        let frame = r#"{"ch":"market.btcusdt.trade.detail","ts":1700000000000,"tick":{"data":[{"id":9988,"ts":1700000000100,"price":35000.5,"amount":0.02,"direction":"buy"}]}}"#;
        let map = CanonicalMap::default();
        match parse(frame, &map) {
            ParseOutcome::Record(Record::Trade(t)) => assert_eq!(t.trade_id, "9988"),
            other => panic!("expected trade, got {other:?}"),
        }
    }
}
