//! Error types for the command line client.

use fee_relayer::{EnvelopeError, FeeError};
use fee_relayer_http::FeeRelayerClientError;
use fee_relayer_svm::SwapError;

/// Errors that can occur while running a command.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        /// Path of the file.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML.
    #[error("invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// A configured header is not a valid HTTP header.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// An argument is not a valid public key.
    #[error("invalid public key {0:?}")]
    InvalidPubkey(String),

    /// Input could not be read.
    #[error("failed to read input: {0}")]
    Input(#[from] std::io::Error),

    /// Relay request failed.
    #[error(transparent)]
    Client(#[from] FeeRelayerClientError),

    /// Swap quote failed.
    #[error("swap error: {0}")]
    Swap(#[from] SwapError),

    /// Fee arithmetic failed.
    #[error("fee error: {0}")]
    Fee(#[from] FeeError),

    /// Relay envelope could not be decoded.
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    /// Output serialization failed.
    #[error("invalid output: {0}")]
    Output(#[from] serde_json::Error),
}
