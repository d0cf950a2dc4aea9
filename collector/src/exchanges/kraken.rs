//! Kraken parser. Data frames are untagged four-element arrays
//! `[channelId, payload, channelName, pair]`; everything else (subscription
//! status, heartbeats) is a JSON object.

use ingest_protocol::{timestamp, CanonicalMap, Record, TickerRecord, TradeRecord};
use serde_json::Value;

use super::ParseOutcome;

pub fn parse(frame: &str, symbols: &CanonicalMap) -> ParseOutcome {
    let Ok(value) = serde_json::from_str::<Value>(frame) else {
        return ParseOutcome::Unrecognized;
    };

    let Value::Array(elements) = value else {
        return ParseOutcome::Control;
    };
    if elements.len() < 4 {
        return ParseOutcome::Unrecognized;
    }

    let channel_name = elements[2].as_str().unwrap_or_default();
    let pair = elements[3].as_str().unwrap_or_default();
    let symbol = symbols.resolve(pair);
    let now = timestamp::normalize_epoch_millis(current_unix_millis());

    if channel_name == "ticker" {
        return parse_ticker(&elements[1], symbol, now);
    }
    if channel_name.starts_with("trade") {
        return parse_trades(&elements[1], symbol);
    }
    ParseOutcome::Control
}

fn parse_ticker(payload: &Value, symbol: String, now: String) -> ParseOutcome {
    let str_at = |key: &str, idx: usize| -> Option<String> {
        payload.get(key)?.get(idx)?.as_str().map(str::to_string)
    };
    let Some(close) = str_at("c", 0) else { return ParseOutcome::Unrecognized };

    let mut record = TickerRecord::new("Kraken", symbol, close, now);
    record.bid = str_at("b", 0);
    record.bid_whole = str_at("b", 1);
    record.bid_qty = str_at("b", 2);
    record.ask = str_at("a", 0);
    record.ask_whole = str_at("a", 1);
    record.ask_qty = str_at("a", 2);
    record.volume_24h = str_at("v", 1);
    record.open_24h = str_at("o", 1);
    record.high_24h = str_at("h", 1);
    record.low_24h = str_at("l", 1);
    ParseOutcome::Record(Record::Ticker(record))
}

fn parse_trades(payload: &Value, symbol: String) -> ParseOutcome {
    let Value::Array(trades) = payload else { return ParseOutcome::Unrecognized };
    let Some(first) = trades.first() else { return ParseOutcome::Unrecognized };
    let Value::Array(fields) = first else { return ParseOutcome::Unrecognized };
    let (Some(price), Some(volume), Some(time)) = (
        fields.first().and_then(Value::as_str),
        fields.get(1).and_then(Value::as_str),
        fields.get(2).and_then(Value::as_f64),
    ) else {
        return ParseOutcome::Unrecognized;
    };
    let ts = timestamp::normalize_epoch_millis((time * 1000.0) as i64);
    let trade_id = format!("{symbol}-{time}");
    ParseOutcome::Record(Record::Trade(TradeRecord::new("Kraken", symbol, price, volume, trade_id, ts)))
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
        let frame = r#"[340,{"a":["35001.00",1,"1.000"],"b":["34999.00",1,"2.000"],"c":["35000.00","0.001"],"v":["10.0","100.0"],"p":["35000.0","35000.0"],"t":[10,100],"l":["34000.00","34000.00"],"h":["35500.00","35500.00"],"o":["34500.00","34500.00"]},"ticker","XBT/USD"]"#;
        let map = CanonicalMap::default();
        match parse(frame, &map) {
            ParseOutcome::Record(Record::Ticker(t)) => {
                assert_eq!(t.symbol, "XBT/USD");
                assert_eq!(t.price, "35000.00");
            }
            other => panic!("expected ticker, got {other:?}"),
        }
    }

    #[test]
    fn non_array_frame_is_control() {
        let map = CanonicalMap::default();
        assert_eq!(parse(r#"{"event":"heartbeat"}"#, &map), ParseOutcome::Control);
    }
}
