//! Relay envelope codec for Solana transactions.

use bincode::Options;
use fee_relayer::envelope::{EnvelopeError, RelayEnvelope};
use fee_relayer::stats::StatsInfo;
use solana_transaction::versioned::VersionedTransaction;

/// Serializes a signed transaction into a relay envelope.
///
/// # Errors
///
/// Returns [`EnvelopeError::MalformedEnvelope`] if the transaction cannot be serialized.
pub fn encode_transaction(
    transaction: &VersionedTransaction,
    info: StatsInfo,
) -> Result<RelayEnvelope, EnvelopeError> {
    let bytes = bincode::serialize(transaction)
        .map_err(|e| EnvelopeError::MalformedEnvelope(format!("{e}")))?;
    Ok(RelayEnvelope::encode(&bytes, info))
}

/// Parses the transaction and statistics out of a relay envelope.
///
/// # Errors
///
/// Returns [`EnvelopeError::MalformedEnvelope`] if the transaction is not
/// base64, does not parse, has trailing bytes, or carries a signature count
/// that disagrees with its message header.
pub fn decode_transaction(
    envelope: &RelayEnvelope,
) -> Result<(VersionedTransaction, StatsInfo), EnvelopeError> {
    let (bytes, info) = envelope.decode()?;
    let transaction: VersionedTransaction = bincode::options()
        .with_fixint_encoding()
        .reject_trailing_bytes()
        .deserialize(&bytes)
        .map_err(|e| EnvelopeError::MalformedEnvelope(format!("Can not decode transaction: {e}")))?;

    let required = usize::from(transaction.message.header().num_required_signatures);
    if transaction.signatures.len() != required {
        return Err(EnvelopeError::MalformedEnvelope(format!(
            "{} signatures for {required} required signers",
            transaction.signatures.len()
        )));
    }
    Ok((transaction, info))
}
