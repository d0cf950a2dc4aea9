//! Subscription Builder: turns a chunk of canonical-catalog symbols into the
//! venue-specific frame(s) sent right after connect. Each venue has its own
//! wire shape; Kraken and Huobi need more than one frame per chunk.

use ingest_protocol::Venue;
use serde_json::json;

/// One or more text frames to send, in order, immediately after the socket
/// opens (after `pre_connect_delay` has elapsed, for venues that need it).
pub fn build(venue: Venue, symbols: &[String]) -> Vec<String> {
    match venue {
        Venue::Binance => vec![build_binance(symbols)],
        Venue::Coinbase => vec![build_coinbase(symbols)],
        Venue::Kraken => build_kraken(symbols),
        Venue::Bitfinex => build_bitfinex(symbols),
        Venue::Huobi => build_huobi(symbols),
        Venue::Okx => build_okx(symbols),
    }
}

fn build_binance(symbols: &[String]) -> String {
    let params: Vec<String> = symbols
        .iter()
        .flat_map(|s| {
            let lower = s.to_lowercase();
            vec![format!("{lower}@ticker"), format!("{lower}@trade")]
        })
        .collect();
    json!({
        "method": "SUBSCRIBE",
        "params": params,
        "id": 1,
    })
    .to_string()
}

fn build_coinbase(symbols: &[String]) -> String {
    json!({
        "type": "subscribe",
        "product_ids": symbols,
        "channels": ["ticker", "matches"],
    })
    .to_string()
}

/// Kraken wants ticker and trade subscribed as two separate frames rather
/// than one frame naming both channels.
fn build_kraken(symbols: &[String]) -> Vec<String> {
    vec![
        json!({
            "event": "subscribe",
            "pair": symbols,
            "subscription": {"name": "ticker"},
        })
        .to_string(),
        json!({
            "event": "subscribe",
            "pair": symbols,
            "subscription": {"name": "trade"},
        })
        .to_string(),
    ]
}

/// Bitfinex sessions carry exactly one symbol (chunk size 1), subscribed on
/// both the ticker and trades channels.
fn build_bitfinex(symbols: &[String]) -> Vec<String> {
    symbols
        .iter()
        .flat_map(|symbol| {
            vec![
                json!({"event": "subscribe", "channel": "ticker", "symbol": symbol}).to_string(),
                json!({"event": "subscribe", "channel": "trades", "symbol": symbol}).to_string(),
            ]
        })
        .collect()
}

/// Huobi sessions also carry one symbol; each needs its own market-ticker
/// and trade-detail subscription frame.
fn build_huobi(symbols: &[String]) -> Vec<String> {
    symbols
        .iter()
        .flat_map(|symbol| {
            let lower = symbol.to_lowercase();
            vec![
                json!({"sub": format!("market.{lower}.ticker"), "id": lower.clone()}).to_string(),
                json!({"sub": format!("market.{lower}.trade.detail"), "id": lower}).to_string(),
            ]
        })
        .collect()
}

/// OKX wants the ticker and trades channels as two distinct `args` frames.
fn build_okx(symbols: &[String]) -> Vec<String> {
    let tickers: Vec<_> = symbols
        .iter()
        .map(|s| json!({"channel": "tickers", "instId": s}))
        .collect();
    let trades: Vec<_> = symbols
        .iter()
        .map(|s| json!({"channel": "trades", "instId": s}))
        .collect();
    vec![
        json!({"op": "subscribe", "args": tickers}).to_string(),
        json!({"op": "subscribe", "args": trades}).to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binance_subscribes_ticker_and_trade_per_symbol() {
        let frames = build(Venue::Binance, &["BTCUSDT".to_string()]);
        assert_eq!(frames.len(), 1);
        assert!(frames[0].contains("btcusdt@ticker"));
        assert!(frames[0].contains("btcusdt@trade"));
    }

    #[test]
    fn kraken_emits_two_frames() {
        let frames = build(Venue::Kraken, &["XBT/USD".to_string()]);
        assert_eq!(frames.len(), 2);
        assert!(frames[0].contains("ticker"));
        assert!(frames[1].contains("trade"));
    }

    #[test]
    fn huobi_emits_two_frames_per_symbol() {
        let frames = build(Venue::Huobi, &["btcusdt".to_string()]);
        assert_eq!(frames.len(), 2);
        assert!(frames[0].contains("market.btcusdt.ticker"));
        assert!(frames[1].contains("market.btcusdt.trade.detail"));
    }

    #[test]
    fn okx_emits_two_args_frames() {
        let frames = build(Venue::Okx, &["BTC-USDT".to_string()]);
        assert_eq!(frames.len(), 2);
        assert!(frames[0].contains("tickers"));
        assert!(frames[1].contains("trades"));
    }

    #[test]
    fn bitfinex_emits_two_frames_for_single_symbol_chunk() {
        let frames = build(Venue::Bitfinex, &["tBTCUSD".to_string()]);
        assert_eq!(frames.len(), 2);
    }
}
