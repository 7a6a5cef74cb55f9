use thiserror::Error;

use crate::record::EventRecord;

#[derive(Debug, Error)]
pub enum CodecError {
    /// The bytes are not a valid encoded record. Retrying will not help.
    #[error("malformed event record: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("failed to encode event record: {0}")]
    Encode(#[source] serde_json::Error),
}

impl CodecError {
    pub fn is_malformed(&self) -> bool {
        matches!(self, CodecError::Malformed(_))
    }
}

pub fn encode(record: &EventRecord) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(record).map_err(CodecError::Encode)
}

pub fn decode(raw: &[u8]) -> Result<EventRecord, CodecError> {
    serde_json::from_slice(raw).map_err(CodecError::Malformed)
}
