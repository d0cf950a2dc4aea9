use std::fmt;

/// The six market-data venues the collector fans in to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Venue {
    Binance,
    Coinbase,
    Kraken,
    Bitfinex,
    Huobi,
    Okx,
}

impl Venue {
    pub const ALL: [Venue; 6] = [
        Venue::Binance,
        Venue::Coinbase,
        Venue::Kraken,
        Venue::Bitfinex,
        Venue::Huobi,
        Venue::Okx,
    ];

    /// The exchange name as it is written into records and BSON filenames.
    pub fn exchange_name(&self) -> &'static str {
        match self {
            Venue::Binance => "Binance",
            Venue::Coinbase => "Coinbase",
            Venue::Kraken => "Kraken",
            Venue::Bitfinex => "Bitfinex",
            Venue::Huobi => "Huobi",
            Venue::Okx => "OKX",
        }
    }

    /// Short lowercase tag used in config keys, metric labels and log lines.
    pub fn tag(&self) -> &'static str {
        match self {
            Venue::Binance => "binance",
            Venue::Coinbase => "coinbase",
            Venue::Kraken => "kraken",
            Venue::Bitfinex => "bitfinex",
            Venue::Huobi => "huobi",
            Venue::Okx => "okx",
        }
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.exchange_name())
    }
}
