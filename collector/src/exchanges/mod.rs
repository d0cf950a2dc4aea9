//! Frame Parsers, one module per venue. Each exposes a single `parse`
//! function from a raw text frame to a [`ParseOutcome`]; venue-specific wire
//! shapes never leak past this module boundary.

pub mod binance;
pub mod bitfinex;
pub mod coinbase;
pub mod huobi;
pub mod kraken;
pub mod okx;

use ingest_protocol::{CanonicalMap, Record, Venue};

/// What a single text frame turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    Record(Record),
    /// Subscription acks and other frames that carry no market data but
    /// aren't malformed either.
    Control,
    /// A heartbeat frame that requires an immediate reply, carrying the
    /// exact text to send back (Huobi's `ping`/`pong` handshake).
    Pong(String),
    /// The frame didn't match any recognized shape for this venue.
    Unrecognized,
}

/// Routes a raw frame to its venue's parser. `session_symbol` is the single
/// canonical symbol owned by sessions whose wire format doesn't carry the
/// symbol on every frame (Bitfinex identifies data only by channel id).
pub fn dispatch(venue: Venue, frame: &str, symbols: &CanonicalMap, session_symbol: &str) -> ParseOutcome {
    match venue {
        Venue::Binance => binance::parse(frame, symbols),
        Venue::Coinbase => coinbase::parse(frame, symbols),
        Venue::Kraken => kraken::parse(frame, symbols),
        Venue::Bitfinex => bitfinex::parse(frame, session_symbol),
        Venue::Huobi => huobi::parse(frame, symbols),
        Venue::Okx => okx::parse(frame, symbols),
    }
}

/// Literal end-to-end scenarios: byte-identical input frames against their
/// documented expected fields, one per venue plus the Huobi keepalive.
#[cfg(test)]
mod scenarios {
    use super::*;

    #[test]
    fn s1_binance_ticker() {
        let frame = r#"{"stream":"btcusdt@ticker","data":{"e":"24hrTicker","E":1700000000000,"s":"BTCUSDT","c":"35000.12","b":"34999.9","B":"1.0","a":"35000.2","A":"0.7","o":"34000","h":"35500","l":"33800","v":"1234.5","q":"42000000","C":1700000000100,"S":"BTCUSDT"}}"#;
        let symbols = CanonicalMap::default();
        match dispatch(Venue::Binance, frame, &symbols, "") {
            ParseOutcome::Record(Record::Ticker(t)) => {
                assert_eq!(t.exchange, "Binance");
                assert_eq!(t.symbol, "BTC-USD");
                assert_eq!(t.price, "35000.12");
                assert_eq!(t.timestamp, "2023-11-14 22:13:20.000000 UTC");
            }
            other => panic!("expected ticker, got {other:?}"),
        }
    }

    #[test]
    fn s2_coinbase_match() {
        let frame = r#"{"type":"match","time":"2023-11-14T22:13:20.001Z","product_id":"BTC-USD","price":"35001.00","size":"0.01","trade_id":12345}"#;
        let symbols = CanonicalMap::default();
        match dispatch(Venue::Coinbase, frame, &symbols, "") {
            ParseOutcome::Record(Record::Trade(t)) => {
                assert_eq!(t.exchange, "Coinbase");
                assert_eq!(t.symbol, "BTC-USD");
                assert_eq!(t.price, "35001.00");
                assert_eq!(t.size, "0.01");
                assert_eq!(t.trade_id, "12345");
                assert_eq!(t.timestamp, "2023-11-14 22:13:20.001000 UTC");
            }
            other => panic!("expected trade, got {other:?}"),
        }
    }

    #[test]
    fn s3_kraken_ticker_passes_through_unmapped_pair() {
        let frame = r#"[340,{"a":["35002","1","1.5"],"b":["35001","2","2.0"],"c":["35001.5","0.1"],"v":["10","20"],"p":["34500","34600"],"l":["33000","33500"],"h":["35500","36000"],"o":{"o":"34000"}},"ticker","XBT/USD"]"#;
        let symbols = CanonicalMap::default();
        match dispatch(Venue::Kraken, frame, &symbols, "") {
            ParseOutcome::Record(Record::Ticker(t)) => {
                assert_eq!(t.exchange, "Kraken");
                assert_eq!(t.symbol, "XBT/USD");
                assert_eq!(t.bid.as_deref(), Some("35001"));
                assert_eq!(t.ask.as_deref(), Some("35002"));
                assert_eq!(t.bid_qty.as_deref(), Some("2.0"));
                assert_eq!(t.ask_qty.as_deref(), Some("1.5"));
                assert_eq!(t.price, "35001.5");
            }
            other => panic!("expected ticker, got {other:?}"),
        }
    }

    #[test]
    fn s4_huobi_ping_pong_emits_no_record() {
        let frame = r#"{"ping":1699999999999}"#;
        let symbols = CanonicalMap::default();
        match dispatch(Venue::Huobi, frame, &symbols, "") {
            ParseOutcome::Pong(reply) => assert_eq!(reply, r#"{"pong":1699999999999}"#),
            other => panic!("expected pong, got {other:?}"),
        }
    }

    #[test]
    fn s5_okx_ticker() {
        let frame = r#"{"arg":{"channel":"tickers","instId":"BTC-USDT"},"data":[{"last":"35003","instId":"BTC-USDT","bidPx":"35002","bidSz":"1","askPx":"35004","askSz":"2","ts":"1700000000000"}]}"#;
        let symbols = CanonicalMap::default();
        match dispatch(Venue::Okx, frame, &symbols, "") {
            ParseOutcome::Record(Record::Ticker(t)) => {
                assert_eq!(t.exchange, "OKX");
                assert_eq!(t.symbol, "BTC-USD");
                assert_eq!(t.price, "35003");
                assert_eq!(t.timestamp, "2023-11-14 22:13:20.000000 UTC");
            }
            other => panic!("expected ticker, got {other:?}"),
        }
    }
}
