//! Errors of the relay HTTP client.

use fee_relayer::FeeRelayerError;
use http::StatusCode;

/// Errors that can occur while talking to the relay.
#[derive(Debug, thiserror::Error)]
pub enum FeeRelayerClientError {
    /// URL parse error.
    #[error("URL parse error: {context}: {source}")]
    UrlParse {
        /// Human-readable context.
        context: &'static str,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },
    /// HTTP transport error.
    #[error("HTTP error: {context}: {source}")]
    Http {
        /// Human-readable context.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// JSON deserialization error.
    #[error("Failed to deserialize JSON: {context}: {source}")]
    JsonDeserialization {
        /// Human-readable context.
        context: &'static str,
        /// The underlying serde error.
        #[source]
        source: serde_json::Error,
    },
    /// Failed to read response body.
    #[error("Failed to read response body as text: {context}: {source}")]
    ResponseBodyRead {
        /// Human-readable context.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// The relay answered with an error object.
    #[error("{context}: {source}")]
    Relay {
        /// Human-readable context.
        context: &'static str,
        /// The decoded relay error.
        #[source]
        source: FeeRelayerError,
    },
    /// Unknown relay failure: non-success status without a relay error body.
    #[error("Unexpected HTTP status {status}: {context}: {body}")]
    HttpStatus {
        /// Human-readable context.
        context: &'static str,
        /// The HTTP status code.
        status: StatusCode,
        /// The response body.
        body: String,
    },
}

impl FeeRelayerClientError {
    /// The relay error, if the relay sent one.
    #[must_use]
    pub const fn relay_error(&self) -> Option<&FeeRelayerError> {
        match self {
            Self::Relay { source, .. } => Some(source),
            _ => None,
        }
    }
}
