//! Canonical Mapper — venue-native symbol spellings to the engine's
//! canonical tag (e.g. `BTC-USD`). Policy is longest-match-wins over a fixed
//! table; anything absent from the table passes through verbatim.

use std::collections::HashMap;

/// `(alias, canonical)` pairs baked into every `CanonicalMap::default()`.
///
/// `XBT/USD` is deliberately absent even though Kraken's own pair token for
/// bitcoin is `XBT/USD` — see DESIGN.md. Any other aliasing scheme is a
/// process restart away by constructing a `CanonicalMap` from a custom table.
const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("tBTCUSD", "BTC-USD"),
    ("BTCUSDT", "BTC-USD"),
    ("BTC-USDT", "BTC-USD"),
    ("BTC/USD", "BTC-USD"),
    ("market.btcusdt", "BTC-USD"),
    ("tADAUSD", "ADA-USD"),
    ("ADAUSDT", "ADA-USD"),
    ("ADA-USDT", "ADA-USD"),
    ("ADA/USD", "ADA-USD"),
    ("market.adausdt", "ADA-USD"),
    ("tETHUSD", "ETH-USD"),
    ("ETHUSDT", "ETH-USD"),
    ("ETH-USDT", "ETH-USD"),
    ("ETH/USD", "ETH-USD"),
    ("market.ethusdt", "ETH-USD"),
    ("tICXUSD", "ICX-USD"),
    ("ICXUSDT", "ICX-USD"),
    ("ICX-USDT", "ICX-USD"),
    ("ICX/USD", "ICX-USD"),
    ("market.icxusdt", "ICX-USD"),
    ("tXBTUSD", "XBT-USD"),
    ("XBTUSDT", "XBT-USD"),
    ("XBT-USDT", "XBT-USD"),
    ("market.xbtusdt", "XBT-USD"),
];

/// A fixed venue-symbol → canonical-symbol table, applied once per record at
/// parse time.
#[derive(Debug, Clone)]
pub struct CanonicalMap {
    aliases: HashMap<String, String>,
}

impl CanonicalMap {
    /// Build a map from an arbitrary alias table, e.g. loaded from config.
    pub fn from_aliases<I, K, V>(aliases: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            aliases: aliases.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Resolve a venue-native token to its canonical symbol. Longest matching
    /// key wins; unknown tokens pass through unchanged.
    pub fn resolve(&self, token: &str) -> String {
        let mut best: Option<(&str, &str)> = None;
        for (alias, canonical) in &self.aliases {
            if token.starts_with(alias.as_str()) {
                if best.map_or(true, |(b, _)| alias.len() > b.len()) {
                    best = Some((alias.as_str(), canonical.as_str()));
                }
            }
        }
        best.map(|(_, canonical)| canonical.to_string())
            .unwrap_or_else(|| token.to_string())
    }
}

impl Default for CanonicalMap {
    fn default() -> Self {
        Self::from_aliases(DEFAULT_ALIASES.iter().map(|(k, v)| (*k, *v)))
    }
}
