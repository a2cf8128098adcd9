//! Relay context: chain constants and per-user relay state needed for fee decisions.

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::fee::FeeError;
use crate::usage::UsageStatus;

/// State of the user's relay account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum RelayAccountStatus {
    /// The account does not exist yet.
    NotYetCreated,
    /// The account exists with `balance` lamports.
    Created {
        /// Current lamports.
        balance: u64,
    },
}

impl RelayAccountStatus {
    /// Balance, if the account exists.
    #[must_use]
    pub const fn balance(&self) -> Option<u64> {
        match self {
            Self::NotYetCreated => None,
            Self::Created { balance } => Some(*balance),
        }
    }
}

/// Everything a fee calculation needs to know about the chain and the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayContext {
    /// Rent-exempt minimum of a token account.
    pub minimum_token_account_balance: u64,
    /// Rent-exempt minimum of the relay account.
    pub minimum_relay_account_balance: u64,
    /// Relay fee payer address.
    pub fee_payer_address: String,
    /// Network fee per signature.
    pub lamports_per_signature: u64,
    /// User's relay account.
    pub relay_account_status: RelayAccountStatus,
    /// User's free-tier counters.
    pub usage_status: UsageStatus,
}

/// Single-writer store holding the current [`RelayContext`].
#[derive(Debug, Default)]
pub struct RelayContextStore {
    state: RwLock<Option<RelayContext>>,
}

impl RelayContextStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the stored context.
    pub async fn get(&self) -> Option<RelayContext> {
        self.state.read().await.clone()
    }

    /// Replaces the stored context.
    pub async fn set(&self, context: RelayContext) {
        *self.state.write().await = Some(context);
    }

    /// Drops the stored context.
    pub async fn clear(&self) {
        *self.state.write().await = None;
    }

    /// Counts a relayed transaction against the cached free-tier usage.
    ///
    /// Returns the updated usage, or `None` if no context is stored.
    ///
    /// # Errors
    ///
    /// Returns [`FeeError::ArithmeticOverflow`] if a counter overflows; the
    /// stored context is left untouched in that case.
    pub async fn record_usage(&self, transaction_fee: u64) -> Result<Option<UsageStatus>, FeeError> {
        let mut guard = self.state.write().await;
        let Some(context) = guard.as_mut() else {
            return Ok(None);
        };
        context.usage_status = context.usage_status.after_transaction(transaction_fee)?;

        #[cfg(feature = "telemetry")]
        tracing::debug!(
            current_usage = context.usage_status.current_usage,
            amount_used = context.usage_status.amount_used,
            "Recorded relay usage"
        );

        Ok(Some(context.usage_status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> RelayContext {
        RelayContext {
            minimum_token_account_balance: 2_039_280,
            minimum_relay_account_balance: 890_880,
            fee_payer_address: "FG4Y3yX4AAchp1HvNZ7LfzFTewF2f6nDoMDCohTFrdpT".to_owned(),
            lamports_per_signature: 5000,
            relay_account_status: RelayAccountStatus::NotYetCreated,
            usage_status: UsageStatus::new(100, 0, 10_000_000, 0),
        }
    }

    #[tokio::test]
    async fn test_get_set_clear() {
        let store = RelayContextStore::new();
        assert_eq!(store.get().await, None);
        store.set(context()).await;
        assert_eq!(store.get().await, Some(context()));
        store.clear().await;
        assert_eq!(store.get().await, None);
    }

    #[tokio::test]
    async fn test_record_usage() {
        let store = RelayContextStore::new();
        assert_eq!(store.record_usage(5000).await, Ok(None));
        store.set(context()).await;
        let usage = store.record_usage(5000).await.unwrap().unwrap();
        assert_eq!(usage.current_usage, 1);
        assert_eq!(usage.amount_used, 5000);
        let stored = store.get().await.unwrap();
        assert_eq!(stored.usage_status, usage);
    }

    #[tokio::test]
    async fn test_record_usage_overflow_keeps_state() {
        let store = RelayContextStore::new();
        let mut ctx = context();
        ctx.usage_status.amount_used = u64::MAX;
        store.set(ctx.clone()).await;
        assert_eq!(store.record_usage(1).await, Err(FeeError::ArithmeticOverflow));
        assert_eq!(store.get().await, Some(ctx));
    }

    #[test]
    fn test_relay_account_status_serde() {
        let json = serde_json::to_value(RelayAccountStatus::Created { balance: 42 }).unwrap();
        assert_eq!(json, serde_json::json!({"status": "created", "balance": 42}));
        assert_eq!(RelayAccountStatus::NotYetCreated.balance(), None);
    }
}
