//! Top-up amount for the user's relay account.
//!
//! Before a relayed transaction the user tops up their relay account with
//! enough lamports to pay the relay back. The top-up itself costs two
//! signatures and may be waived by the free tier, as may the transaction.

use crate::context::RelayContext;
use crate::fee::{FeeAmount, FeeError};

/// Wrapped SOL mint address.
pub const WRAPPED_SOL_MINT: &str = "So11111111111111111111111111111111111111112";

/// Computes how much the relay account has to be topped up.
pub trait RelayFeeCalculator {
    /// Lamports to top up so the relay can pay `expected_fee`.
    ///
    /// `paying_token_mint` is the mint the user pays the fee with.
    ///
    /// # Errors
    ///
    /// Returns [`FeeError::ArithmeticOverflow`] on overflow.
    fn calculate_needed_top_up_amount(
        &self,
        context: &RelayContext,
        expected_fee: FeeAmount,
        paying_token_mint: Option<&str>,
    ) -> Result<FeeAmount, FeeError>;
}

/// Top-up calculator used by the relay service.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRelayFeeCalculator;

impl DefaultRelayFeeCalculator {
    /// The relay rejects smaller top ups.
    pub const MINIMUM_TOP_UP_AMOUNT: u64 = 10_000;

    fn minimum_top_up_amount(
        context: &RelayContext,
        expected_fee: FeeAmount,
        paying_token_mint: Option<&str>,
    ) -> Result<FeeAmount, FeeError> {
        let top_up_fee = context
            .lamports_per_signature
            .checked_mul(2)
            .ok_or(FeeError::ArithmeticOverflow)?;

        let needed_top_up_fee = if context
            .usage_status
            .is_free_transaction_fee_available(top_up_fee)
        {
            0
        } else {
            top_up_fee
        };

        let after_top_up = context.usage_status.after_transaction(top_up_fee)?;
        let needed_transaction_fee =
            if after_top_up.is_free_transaction_fee_available(expected_fee.transaction_fee) {
                0
            } else {
                expected_fee.transaction_fee
            };

        let mut needed = FeeAmount::new(
            needed_top_up_fee
                .checked_add(needed_transaction_fee)
                .ok_or(FeeError::ArithmeticOverflow)?,
            expected_fee.account_creation_fee,
        );
        if needed.is_free() {
            return Ok(needed);
        }
        let without_relay_account = needed;

        match context.relay_account_status.balance() {
            None => {
                needed.account_creation_fee = needed
                    .account_creation_fee
                    .checked_add(context.minimum_relay_account_balance)
                    .ok_or(FeeError::ArithmeticOverflow)?;
            }
            Some(balance) if balance < context.minimum_relay_account_balance => {
                needed.account_creation_fee = needed
                    .account_creation_fee
                    .checked_add(context.minimum_relay_account_balance - balance)
                    .ok_or(FeeError::ArithmeticOverflow)?;
            }
            Some(balance) => {
                let spare = balance - context.minimum_relay_account_balance;
                if spare >= needed.transaction_fee {
                    let spare = spare - needed.transaction_fee;
                    needed.transaction_fee = 0;
                    needed.account_creation_fee = needed.account_creation_fee.saturating_sub(spare);
                } else {
                    needed.transaction_fee -= spare;
                }
            }
        }

        // Paying in wrapped SOL compensates the relay directly.
        if !needed.is_free() && paying_token_mint == Some(WRAPPED_SOL_MINT) {
            return Ok(without_relay_account);
        }
        Ok(needed)
    }
}

impl RelayFeeCalculator for DefaultRelayFeeCalculator {
    fn calculate_needed_top_up_amount(
        &self,
        context: &RelayContext,
        expected_fee: FeeAmount,
        paying_token_mint: Option<&str>,
    ) -> Result<FeeAmount, FeeError> {
        let mut amount = Self::minimum_top_up_amount(context, expected_fee, paying_token_mint)?;
        let total = amount.total()?;
        if total > 0 && total < Self::MINIMUM_TOP_UP_AMOUNT {
            amount.transaction_fee += Self::MINIMUM_TOP_UP_AMOUNT - total;
        }

        #[cfg(feature = "telemetry")]
        tracing::debug!(%expected_fee, top_up = %amount, "Calculated top up amount");

        Ok(amount)
    }
}
