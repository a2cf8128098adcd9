//! Fee amounts expressed in the smallest unit of a token.
//!
//! A [`FeeAmount`] splits what a relay must be compensated for into the
//! network transaction fee and the rent it fronts for newly created accounts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

/// Errors raised by fee arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FeeError {
    /// A sum or product left the `u64` range.
    #[error("Fee arithmetic overflow")]
    ArithmeticOverflow,
}

/// Network fee plus account-creation rent, both in the smallest token unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeAmount {
    /// Fee paid for signatures.
    pub transaction_fee: u64,
    /// Rent-exempt deposits for accounts created on the user's behalf.
    pub account_creation_fee: u64,
}

impl FeeAmount {
    /// A fee of zero in both components.
    pub const ZERO: Self = Self::new(0, 0);

    /// Creates a fee amount from its two components.
    #[must_use]
    pub const fn new(transaction_fee: u64, account_creation_fee: u64) -> Self {
        Self {
            transaction_fee,
            account_creation_fee,
        }
    }

    /// Componentwise sum.
    ///
    /// # Errors
    ///
    /// Returns [`FeeError::ArithmeticOverflow`] if either component overflows.
    pub const fn checked_add(self, other: Self) -> Result<Self, FeeError> {
        let Some(transaction_fee) = self.transaction_fee.checked_add(other.transaction_fee) else {
            return Err(FeeError::ArithmeticOverflow);
        };
        let Some(account_creation_fee) = self
            .account_creation_fee
            .checked_add(other.account_creation_fee)
        else {
            return Err(FeeError::ArithmeticOverflow);
        };
        Ok(Self::new(transaction_fee, account_creation_fee))
    }

    /// Sum of both components.
    ///
    /// # Errors
    ///
    /// Returns [`FeeError::ArithmeticOverflow`] if the sum does not fit in `u64`.
    pub const fn total(&self) -> Result<u64, FeeError> {
        match self.transaction_fee.checked_add(self.account_creation_fee) {
            Some(total) => Ok(total),
            None => Err(FeeError::ArithmeticOverflow),
        }
    }

    /// Returns `true` when nothing has to be paid.
    #[must_use]
    pub const fn is_free(&self) -> bool {
        self.transaction_fee == 0 && self.account_creation_fee == 0
    }

    /// Sums an iterator of fees, failing on the first overflow.
    ///
    /// # Errors
    ///
    /// Returns [`FeeError::ArithmeticOverflow`] if the running sum overflows.
    pub fn try_sum<I>(fees: I) -> Result<Self, FeeError>
    where
        I: IntoIterator<Item = Self>,
    {
        fees.into_iter().try_fold(Self::ZERO, Self::checked_add)
    }
}

impl Add for FeeAmount {
    type Output = Result<Self, FeeError>;

    fn add(self, rhs: Self) -> Self::Output {
        self.checked_add(rhs)
    }
}

impl fmt::Display for FeeAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "transaction: {}, account creation: {}",
            self.transaction_fee, self.account_creation_fee
        )
    }
}
