//! Canonical data model shared between the collector's venue handlers and its
//! output sinks: the two record kinds, the venue table, the symbol mapper,
//! and the timestamp normalizer.

pub mod canonical;
pub mod error;
pub mod record;
pub mod timestamp;
pub mod venue;

pub use canonical::CanonicalMap;
pub use error::ProtocolError;
pub use record::{Record, RecordKind, TickerRecord, TradeRecord};
pub use venue::Venue;
