//! OKX parser. Frames are `{"arg": {"channel": ..., "instId": ...}, "data": [...]}`;
//! `arg.channel` discriminates tickers vs. trades.

use ingest_protocol::{timestamp, CanonicalMap, Record, TickerRecord, TradeRecord};
use serde::Deserialize;

use super::ParseOutcome;

#[derive(Debug, Deserialize)]
struct Arg {
    channel: String,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    arg: Option<Arg>,
    #[serde(default)]
    data: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct TickerEntry {
    #[serde(rename = "instId")]
    inst_id: String,
    last: String,
    #[serde(rename = "bidPx")]
    bid_px: Option<String>,
    #[serde(rename = "bidSz")]
    bid_sz: Option<String>,
    #[serde(rename = "askPx")]
    ask_px: Option<String>,
    #[serde(rename = "askSz")]
    ask_sz: Option<String>,
    #[serde(rename = "open24h")]
    open_24h: Option<String>,
    #[serde(rename = "high24h")]
    high_24h: Option<String>,
    #[serde(rename = "low24h")]
    low_24h: Option<String>,
    #[serde(rename = "vol24h")]
    vol_24h: Option<String>,
    ts: String,
}

#[derive(Debug, Deserialize)]
struct TradeEntry {
    #[serde(rename = "instId")]
    inst_id: String,
    #[serde(rename = "tradeId")]
    trade_id: String,
    px: String,
    sz: String,
    side: String,
    ts: String,
}

pub fn parse(frame: &str, symbols: &CanonicalMap) -> ParseOutcome {
    let Ok(envelope) = serde_json::from_str::<Envelope>(frame) else {
        return ParseOutcome::Unrecognized;
    };
    let Some(arg) = envelope.arg else { return ParseOutcome::Control };

    match arg.channel.as_str() {
        "tickers" => {
            let Some(first) = envelope.data.first() else { return ParseOutcome::Unrecognized };
            let Ok(entry) = serde_json::from_value::<TickerEntry>(first.clone()) else {
                return ParseOutcome::Unrecognized;
            };
            let symbol = symbols.resolve(&entry.inst_id);
            let ts = timestamp::normalize_epoch_millis(entry.ts.parse().unwrap_or(0));
            let mut record = TickerRecord::new("OKX", symbol, entry.last, ts);
            record.bid = entry.bid_px;
            record.bid_qty = entry.bid_sz;
            record.ask = entry.ask_px;
            record.ask_qty = entry.ask_sz;
            record.open_24h = entry.open_24h;
            record.high_24h = entry.high_24h;
            record.low_24h = entry.low_24h;
            record.volume_24h = entry.vol_24h;
            ParseOutcome::Record(Record::Ticker(record))
        }
        "trades" => {
            let Some(first) = envelope.data.first() else { return ParseOutcome::Unrecognized };
            let Ok(entry) = serde_json::from_value::<TradeEntry>(first.clone()) else {
                return ParseOutcome::Unrecognized;
            };
            let symbol = symbols.resolve(&entry.inst_id);
            let ts = timestamp::normalize_epoch_millis(entry.ts.parse().unwrap_or(0));
            let mut record = TradeRecord::new("OKX", symbol, entry.px, entry.sz, entry.trade_id, ts);
            record.market_maker = Some(entry.side == "sell");
            ParseOutcome::Record(Record::Trade(record))
        }
        _ => ParseOutcome::Control,
    }
}
