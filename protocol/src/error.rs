use thiserror::Error;

/// Failures that can occur while working with canonical records, independent
/// of any particular venue or transport.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("failed to serialize record to BSON: {0}")]
    BsonSerialize(#[from] bson::ser::Error),
}
