//! The relay HTTP API as seen by this client.
//!
//! [`FeeRelayerApi`] is the network boundary. Implementations perform a single
//! request per call; retries and timeouts belong to the implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::envelope::RelayEnvelope;
use crate::usage::UsageStatus;

/// Metadata for a token the relay accepts as fee payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeTokenData {
    /// Token name.
    pub name: String,
    /// Ticker.
    pub code: String,
    /// Mint address.
    pub mint: String,
    /// Relay account receiving fees in this token.
    pub account: String,
    /// Token units per lamport.
    pub exchange_rate: f64,
}

/// `GET /free_fee_limits/{authority}` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeLimitForAuthorityResponse {
    /// Authority public key bytes.
    pub authority: Vec<u8>,
    /// Configured limits.
    pub limits: Limits,
    /// Fees already processed in the period.
    pub processed_fee: ProcessedFee,
}

/// Free-tier limits configured on the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Whether free fees are enabled for the authority.
    pub use_free_fee: bool,
    /// Cumulative fee amount that may be waived.
    pub max_fee_amount: u64,
    /// Number of transactions that may be waived.
    pub max_fee_count: u64,
    /// Cumulative rent that may be waived.
    pub max_token_account_creation_amount: u64,
    /// Number of account creations that may be waived.
    pub max_token_account_creation_count: u64,
    /// Length of the accounting period.
    pub period: Period,
}

/// Accounting period length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    /// Whole seconds.
    pub secs: u64,
    /// Sub-second nanoseconds.
    pub nanos: u32,
}

/// Fees already waived in the current period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedFee {
    /// Sum of waived fees.
    pub total_fee_amount: u64,
    /// Number of waived transactions.
    pub fee_count: u64,
    /// Number of waived account creations.
    pub rent_count: u64,
}

impl From<FeeLimitForAuthorityResponse> for UsageStatus {
    fn from(response: FeeLimitForAuthorityResponse) -> Self {
        Self::new(
            response.limits.max_fee_count,
            response.processed_fee.fee_count,
            response.limits.max_fee_amount,
            response.processed_fee.total_fee_amount,
        )
    }
}

/// A transaction submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayRequest {
    /// Relay signs as fee payer and broadcasts.
    RelayTransaction(RelayEnvelope),
    /// Relay only returns its fee payer signature.
    SignRelayTransaction(RelayEnvelope),
}

impl RelayRequest {
    /// Path of the broadcast endpoint.
    pub const RELAY_TRANSACTION_PATH: &'static str = "relay_transaction";
    /// Path of the sign-only endpoint.
    pub const SIGN_RELAY_TRANSACTION_PATH: &'static str = "sign_relay_transaction";

    /// Endpoint path relative to the API base.
    #[must_use]
    pub const fn path(&self) -> &'static str {
        match self {
            Self::RelayTransaction(_) => Self::RELAY_TRANSACTION_PATH,
            Self::SignRelayTransaction(_) => Self::SIGN_RELAY_TRANSACTION_PATH,
        }
    }

    /// Request body.
    #[must_use]
    pub const fn envelope(&self) -> &RelayEnvelope {
        match self {
            Self::RelayTransaction(envelope) | Self::SignRelayTransaction(envelope) => envelope,
        }
    }
}

/// `POST /sign_relay_transaction` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedRelayTransaction {
    /// Fee payer signature, base58.
    pub signature: String,
    /// Transaction with the fee payer signature applied, base64.
    pub transaction: String,
}

/// Result of a transaction submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayResponse {
    /// Signature of the broadcast transaction.
    Signature(String),
    /// Fee payer partial signature for later submission.
    Signed(SignedRelayTransaction),
}

impl RelayResponse {
    /// Signature returned by the relay, whichever the request kind.
    #[must_use]
    pub fn signature(&self) -> &str {
        match self {
            Self::Signature(signature) => signature,
            Self::Signed(signed) => &signed.signature,
        }
    }
}

/// Operations this client needs from a fee relay.
#[async_trait]
pub trait FeeRelayerApi: Send + Sync {
    /// Error returned by the transport.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Address of the relay fee payer.
    async fn get_fee_payer_pubkey(&self) -> Result<String, Self::Error>;

    /// Fee token metadata for `mint`.
    async fn fee_token_data(&self, mint: &str) -> Result<FeeTokenData, Self::Error>;

    /// Free-tier counters for `authority`.
    async fn get_free_fee_limits(&self, authority: &str) -> Result<UsageStatus, Self::Error>;

    /// Legacy name of [`FeeRelayerApi::get_free_fee_limits`].
    #[deprecated(note = "use `get_free_fee_limits`")]
    async fn request_free_fee_limits(&self, authority: &str) -> Result<UsageStatus, Self::Error> {
        self.get_free_fee_limits(authority).await
    }

    /// Submits a signed transaction.
    async fn send_transaction(&self, request: &RelayRequest) -> Result<RelayResponse, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{DeviceType, Environment, OperationType, StatsInfo};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, thiserror::Error)]
    #[error("unused")]
    struct Never;

    #[derive(Default)]
    struct CountingApi {
        limit_calls: AtomicUsize,
    }

    #[async_trait]
    impl FeeRelayerApi for CountingApi {
        type Error = Never;

        async fn get_fee_payer_pubkey(&self) -> Result<String, Never> {
            Ok("FG4Y3yX4AAchp1HvNZ7LfzFTewF2f6nDoMDCohTFrdpT".to_owned())
        }

        async fn fee_token_data(&self, mint: &str) -> Result<FeeTokenData, Never> {
            Ok(FeeTokenData {
                name: "USDT".to_owned(),
                code: "USDT".to_owned(),
                mint: mint.to_owned(),
                account: String::new(),
                exchange_rate: 0.0,
            })
        }

        async fn get_free_fee_limits(&self, _authority: &str) -> Result<UsageStatus, Never> {
            self.limit_calls.fetch_add(1, Ordering::SeqCst);
            Ok(UsageStatus::new(100, 1, 10_000_000, 5000))
        }

        async fn send_transaction(&self, request: &RelayRequest) -> Result<RelayResponse, Never> {
            Ok(RelayResponse::Signature(request.path().to_owned()))
        }
    }

    #[test]
    fn test_limits_response_to_usage_status() {
        let json = serde_json::json!({
            "authority": [1, 2, 3],
            "limits": {
                "use_free_fee": true,
                "max_fee_amount": 10_000_000,
                "max_fee_count": 100,
                "max_token_account_creation_amount": 10_000_000,
                "max_token_account_creation_count": 30,
                "period": {"secs": 86400, "nanos": 0}
            },
            "processed_fee": {"total_fee_amount": 15000, "fee_count": 3, "rent_count": 0}
        });
        let response: FeeLimitForAuthorityResponse = serde_json::from_value(json).unwrap();
        let status = UsageStatus::from(response);
        assert_eq!(status, UsageStatus::new(100, 3, 10_000_000, 15000));
    }

    #[tokio::test]
    #[allow(deprecated)]
    async fn test_request_free_fee_limits_delegates() {
        let api = CountingApi::default();
        let legacy = api.request_free_fee_limits("owner").await.unwrap();
        let current = api.get_free_fee_limits("owner").await.unwrap();
        assert_eq!(legacy, current);
        assert_eq!(api.limit_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_request_paths() {
        let api = CountingApi::default();
        let envelope = RelayEnvelope::encode(
            &[1],
            StatsInfo::new(OperationType::Transfer, DeviceType::Web, Environment::Dev),
        );
        let relay = api
            .send_transaction(&RelayRequest::RelayTransaction(envelope.clone()))
            .await
            .unwrap();
        assert_eq!(relay.signature(), "relay_transaction");
        let sign = RelayRequest::SignRelayTransaction(envelope);
        assert_eq!(sign.path(), "sign_relay_transaction");
    }
}
