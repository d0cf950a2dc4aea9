//! Bitfinex parser. Each session subscribes exactly one symbol, and data
//! frames identify only a numeric channel id, not the symbol itself — so the
//! canonical symbol for a frame comes from the session that received it,
//! not from the frame's own contents.

use ingest_protocol::{timestamp, Record, TickerRecord, TradeRecord};
use serde_json::Value;

use super::ParseOutcome;

pub fn parse(frame: &str, canonical_symbol: &str) -> ParseOutcome {
    let Ok(value) = serde_json::from_str::<Value>(frame) else {
        return ParseOutcome::Unrecognized;
    };

    let Value::Array(elements) = value else {
        // {"event": "subscribed", ...} or {"event": "info", ...}
        return ParseOutcome::Control;
    };
    if elements.len() < 2 {
        return ParseOutcome::Unrecognized;
    }

    let payload = &elements[1];
    if let Some(label) = payload.as_str() {
        // "hb" heartbeat, or a te/tu tag followed by a third array element.
        if label == "hb" {
            return ParseOutcome::Control;
        }
        if (label == "te" || label == "tu") && elements.len() >= 3 {
            return parse_trade_fields(&elements[2], canonical_symbol);
        }
        return ParseOutcome::Control;
    }

    let Value::Array(fields) = payload else { return ParseOutcome::Unrecognized };
    if fields.len() >= 10 && fields.iter().all(Value::is_number) {
        return parse_ticker_fields(fields, canonical_symbol);
    }
    ParseOutcome::Control
}

fn parse_ticker_fields(fields: &[Value], symbol: &str) -> ParseOutcome {
    let n = |i: usize| fields.get(i).and_then(Value::as_f64).map(|v| v.to_string());
    let Some(last_price) = n(6) else { return ParseOutcome::Unrecognized };
    let now = timestamp::normalize_epoch_millis(current_unix_millis());
    let mut record = TickerRecord::new("Bitfinex", symbol, last_price, now);
    record.bid = n(0);
    record.bid_qty = n(1);
    record.ask = n(2);
    record.ask_qty = n(3);
    record.volume_24h = n(7);
    record.high_24h = n(8);
    record.low_24h = n(9);
    ParseOutcome::Record(Record::Ticker(record))
}

fn parse_trade_fields(fields: &Value, symbol: &str) -> ParseOutcome {
    let Value::Array(fields) = fields else { return ParseOutcome::Unrecognized };
    let get = |i: usize| fields.get(i).and_then(Value::as_f64);
    let (Some(id), Some(mts), Some(amount), Some(price)) = (get(0), get(1), get(2), get(3)) else {
        return ParseOutcome::Unrecognized;
    };
    let ts = timestamp::normalize_epoch_millis(mts as i64);
    let record = TradeRecord::new("Bitfinex", symbol, price.to_string(), amount.abs().to_string(), (id as i64).to_string(), ts);
    ParseOutcome::Record(Record::Trade(record))
}

fn current_unix_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ticker_array() {
        let frame = "[17470,[34999.0,1.0,35001.0,1.0,10.0,0.01,35000.0,1000.0,35500.0,34000.0]]";
        match parse(frame, "tBTCUSD") {
            ParseOutcome::Record(Record::Ticker(t)) => assert_eq!(t.price, "35000"),
            other => panic!("expected ticker, got {other:?}"),
        }
    }

    #[test]
    fn parses_trade_update() {
        let frame = r#"[17470,"te",[412, 1700000000000, 0.01, 35000.5]]"#;
        match parse(frame, "tBTCUSD") {
            ParseOutcome::Record(Record::Trade(t)) => {
                assert_eq!(t.trade_id, "412");
                assert_eq!(t.size, "0.01");
            }
            other => panic!("expected trade, got {other:?}"),
        }
    }

    #[test]
    fn heartbeat_is_control() {
        assert_eq!(parse(r#"[17470,"hb"]"#, "tBTCUSD"), ParseOutcome::Control);
    }
}
