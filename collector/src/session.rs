//! Session identity and state machine. A `SessionKey` replaces a
//! stringly-typed `"huobi-websocket-N"` protocol name with a small struct,
//! rather than building per-venue identifiers out of string concatenation.

use std::fmt;

use ingest_protocol::Venue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub venue: Venue,
    pub chunk_index: usize,
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.venue.tag(), self.chunk_index)
    }
}

/// Lifecycle of a single venue session, per the connect → subscribe → live →
/// backoff cycle. `Idle` only occurs before a session's first connect
/// attempt; every subsequent cycle goes `Backoff -> Connecting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Subscribing,
    Live,
    Backoff,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionState::Idle => "idle",
            SessionState::Connecting => "connecting",
            SessionState::Subscribing => "subscribing",
            SessionState::Live => "live",
            SessionState::Backoff => "backoff",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_key_formats_as_venue_and_index() {
        let key = SessionKey { venue: Venue::Huobi, chunk_index: 3 };
        assert_eq!(key.to_string(), "huobi#3");
    }

    #[test]
    fn distinct_chunk_indexes_are_distinct_keys() {
        let a = SessionKey { venue: Venue::Huobi, chunk_index: 0 };
        let b = SessionKey { venue: Venue::Huobi, chunk_index: 1 };
        assert_ne!(a, b);
    }
}
