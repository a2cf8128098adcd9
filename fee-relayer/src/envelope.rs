//! Relay envelope: a serialized signed transaction plus [`StatsInfo`].
//!
//! On the wire the envelope is `{"transaction": "<base64>", "info": {...}}`.
//! This module only deals with bytes; turning the bytes into a chain
//! transaction is left to the chain crate.

use serde::{Deserialize, Serialize};

use crate::encoding::Base64Bytes;
use crate::stats::StatsInfo;

/// Errors from the envelope codec.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    /// The envelope content could not be decoded.
    #[error("Malformed relay envelope: {0}")]
    MalformedEnvelope(String),
}

/// Wire form of a relay envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayEnvelope {
    /// Base64 of the binary-encoded signed transaction.
    pub transaction: Base64Bytes,
    /// Relay accounting metadata.
    pub info: StatsInfo,
}

impl RelayEnvelope {
    /// Wraps already serialized transaction bytes.
    #[must_use]
    pub fn encode(transaction: &[u8], info: StatsInfo) -> Self {
        Self {
            transaction: Base64Bytes::encode(transaction),
            info,
        }
    }

    /// Returns the raw transaction bytes and the statistics.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::MalformedEnvelope`] if the transaction field
    /// is not valid base64 or is empty.
    pub fn decode(&self) -> Result<(Vec<u8>, StatsInfo), EnvelopeError> {
        let bytes = self
            .transaction
            .decode()
            .map_err(|e| EnvelopeError::MalformedEnvelope(format!("transaction is not base64: {e}")))?;
        if bytes.is_empty() {
            return Err(EnvelopeError::MalformedEnvelope(
                "transaction is empty".to_owned(),
            ));
        }
        Ok((bytes, self.info.clone()))
    }

    /// Parses the JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::MalformedEnvelope`] if the JSON does not match the envelope shape.
    pub fn from_json(json: &str) -> Result<Self, EnvelopeError> {
        serde_json::from_str(json).map_err(|e| EnvelopeError::MalformedEnvelope(e.to_string()))
    }
}
