//! Free-tier usage accounting.

use serde::{Deserialize, Serialize};

use crate::fee::FeeError;

/// Snapshot of a user's free-fee counters for the current period.
///
/// Supplied by the relay server; this type only evaluates it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStatus {
    /// Number of free transactions allowed in the period.
    pub max_usage: u64,
    /// Number of free transactions already consumed.
    pub current_usage: u64,
    /// Cumulative fee amount that may be waived in the period.
    pub max_amount: u64,
    /// Cumulative fee amount already waived.
    pub amount_used: u64,
    /// Whether the user hit the payment-link creation limit.
    ///
    /// Has no influence on fee waiving.
    pub reached_limit_link_creation: bool,
}

impl UsageStatus {
    /// Creates a usage snapshot with the link-creation flag cleared.
    #[must_use]
    pub const fn new(max_usage: u64, current_usage: u64, max_amount: u64, amount_used: u64) -> Self {
        Self {
            max_usage,
            current_usage,
            max_amount,
            amount_used,
            reached_limit_link_creation: false,
        }
    }

    /// Returns `true` when `transaction_fee` may be paid by the free tier.
    ///
    /// Both the usage counter (strictly below the cap) and the cumulative
    /// amount (at or below the cap after adding the fee) must allow it.
    #[must_use]
    pub const fn is_free_transaction_fee_available(&self, transaction_fee: u64) -> bool {
        if self.current_usage >= self.max_usage {
            return false;
        }
        match self.amount_used.checked_add(transaction_fee) {
            Some(total) => total <= self.max_amount,
            None => false,
        }
    }

    /// Returns the snapshot as it would look after one more waived transaction.
    ///
    /// # Errors
    ///
    /// Returns [`FeeError::ArithmeticOverflow`] if a counter overflows.
    pub const fn after_transaction(self, transaction_fee: u64) -> Result<Self, FeeError> {
        let Some(current_usage) = self.current_usage.checked_add(1) else {
            return Err(FeeError::ArithmeticOverflow);
        };
        let Some(amount_used) = self.amount_used.checked_add(transaction_fee) else {
            return Err(FeeError::ArithmeticOverflow);
        };
        Ok(Self {
            current_usage,
            amount_used,
            ..self
        })
    }
}
