//! Transaction layout of a swap, shared by the fee calculator and the builder.
//!
//! The layout decides how many instructions and signatures each transaction
//! carries and whether persistent account creation moves into a separate
//! setup transaction. Fees are derived from the layout only, so a quote and
//! the transactions built for it always agree.

use fee_relayer::{FeeAmount, FeeError};

use crate::error::SwapError;

/// Instructions spent on a native SOL source: transfer, create, initialize, close.
const NATIVE_SOURCE_INSTRUCTIONS: usize = 4;

/// Instructions spent on a native SOL destination: create, initialize, close.
const NATIVE_DESTINATION_INSTRUCTIONS: usize = 3;

/// What a swap needs before it is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteShape {
    /// Pool hops.
    pub hops: usize,
    /// Input is native SOL, wrapped in an ephemeral account.
    pub native_source: bool,
    /// Output is native SOL, received in an ephemeral account.
    pub native_destination: bool,
    /// Transit token accounts to create.
    pub transit_creations: usize,
    /// Destination token account to create.
    pub destination_creation: bool,
}

impl RouteShape {
    const fn persistent_creations(&self) -> usize {
        self.transit_creations + self.destination_creation as usize
    }

    const fn ephemeral_accounts(&self) -> u64 {
        self.native_source as u64 + self.native_destination as u64
    }

    const fn swap_instructions(&self) -> usize {
        let mut count = self.hops;
        if self.native_source {
            count += NATIVE_SOURCE_INSTRUCTIONS;
        }
        if self.native_destination {
            count += NATIVE_DESTINATION_INSTRUCTIONS;
        }
        count
    }
}

/// Size and cost of one transaction in a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionShape {
    /// Instruction count.
    pub instructions: usize,
    /// Required signatures.
    pub signatures: u64,
    /// Token accounts created and funded by the fee payer.
    pub account_creations: u64,
}

impl TransactionShape {
    /// Network fee and rent the relay fronts for this transaction.
    ///
    /// # Errors
    ///
    /// Returns [`FeeError::ArithmeticOverflow`] on overflow.
    pub const fn expected_fee(
        &self,
        lamports_per_signature: u64,
        minimum_token_account_balance: u64,
    ) -> Result<FeeAmount, FeeError> {
        let Some(transaction_fee) = lamports_per_signature.checked_mul(self.signatures) else {
            return Err(FeeError::ArithmeticOverflow);
        };
        let Some(account_creation_fee) =
            minimum_token_account_balance.checked_mul(self.account_creations)
        else {
            return Err(FeeError::ArithmeticOverflow);
        };
        Ok(FeeAmount::new(transaction_fee, account_creation_fee))
    }
}

/// A route laid out into one or two transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapLayout {
    /// The route being laid out.
    pub shape: RouteShape,
    /// Persistent account creation runs in a setup transaction first.
    pub split: bool,
}

impl SwapLayout {
    /// Lays out `shape` under `max_instructions` per transaction.
    ///
    /// # Errors
    ///
    /// - [`SwapError::EmptyRoute`] if the route has no hops
    /// - [`SwapError::TransactionTooLarge`] if the swap does not fit even
    ///   with account creation moved out
    pub fn plan(shape: RouteShape, max_instructions: usize) -> Result<Self, SwapError> {
        if shape.hops == 0 {
            return Err(SwapError::EmptyRoute);
        }
        let swap_only = shape.swap_instructions();
        let inline = swap_only + shape.persistent_creations();
        if inline <= max_instructions {
            return Ok(Self { shape, split: false });
        }
        if shape.persistent_creations() == 0 || swap_only > max_instructions {
            return Err(SwapError::TransactionTooLarge {
                instructions: if shape.persistent_creations() == 0 { inline } else { swap_only },
                limit: max_instructions,
            });
        }
        if shape.persistent_creations() > max_instructions {
            return Err(SwapError::TransactionTooLarge {
                instructions: shape.persistent_creations(),
                limit: max_instructions,
            });
        }

        #[cfg(feature = "telemetry")]
        tracing::debug!(
            instructions = inline,
            limit = max_instructions,
            "Moving account creation into a setup transaction"
        );

        Ok(Self { shape, split: true })
    }

    /// Setup transaction, present when split. Only the fee payer signs it.
    #[must_use]
    pub const fn setup(&self) -> Option<TransactionShape> {
        if !self.split {
            return None;
        }
        let creations = self.shape.persistent_creations();
        Some(TransactionShape {
            instructions: creations,
            signatures: 1,
            account_creations: creations as u64,
        })
    }

    /// Swap transaction, signed by the fee payer, the owner and every
    /// ephemeral wrapped SOL account.
    #[must_use]
    pub const fn swap(&self) -> TransactionShape {
        let inline_creations = if self.split {
            0
        } else {
            self.shape.persistent_creations()
        };
        TransactionShape {
            instructions: self.shape.swap_instructions() + inline_creations,
            signatures: 2 + self.shape.ephemeral_accounts(),
            account_creations: inline_creations as u64,
        }
    }

    /// Transactions in execution order.
    #[must_use]
    pub fn transactions(&self) -> Vec<TransactionShape> {
        self.setup().into_iter().chain([self.swap()]).collect()
    }

    /// Fee the relay is compensated for across all transactions.
    ///
    /// # Errors
    ///
    /// Returns [`FeeError::ArithmeticOverflow`] on overflow.
    pub fn network_fee(
        &self,
        lamports_per_signature: u64,
        minimum_token_account_balance: u64,
    ) -> Result<FeeAmount, FeeError> {
        self.transactions()
            .iter()
            .map(|tx| tx.expected_fee(lamports_per_signature, minimum_token_account_balance))
            .try_fold(FeeAmount::ZERO, |sum, fee| sum.checked_add(fee?))
    }

    /// Rent of the ephemeral wrapped SOL accounts. It is returned to the
    /// owner when they close, so the relay charges it back separately.
    ///
    /// # Errors
    ///
    /// Returns [`FeeError::ArithmeticOverflow`] on overflow.
    pub const fn additional_payback_fee(
        &self,
        minimum_token_account_balance: u64,
    ) -> Result<u64, FeeError> {
        match minimum_token_account_balance.checked_mul(self.shape.ephemeral_accounts()) {
            Some(fee) => Ok(fee),
            None => Err(FeeError::ArithmeticOverflow),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const fn shape(hops: usize) -> RouteShape {
        RouteShape {
            hops,
            native_source: false,
            native_destination: false,
            transit_creations: 0,
            destination_creation: false,
        }
    }

    #[test]
    fn test_direct_swap_single_transaction() {
        let layout = SwapLayout::plan(shape(1), 7).unwrap();
        assert!(!layout.split);
        assert_eq!(
            layout.transactions(),
            vec![TransactionShape {
                instructions: 1,
                signatures: 2,
                account_creations: 0,
            }]
        );
        assert_eq!(layout.network_fee(5000, 2_039_280).unwrap(), FeeAmount::new(10_000, 0));
        assert_eq!(layout.additional_payback_fee(2_039_280).unwrap(), 0);
    }

    #[test]
    fn test_native_source_adds_signature_and_payback() {
        let layout = SwapLayout::plan(
            RouteShape {
                native_source: true,
                destination_creation: true,
                ..shape(1)
            },
            7,
        )
        .unwrap();
        assert!(!layout.split);
        assert_eq!(layout.swap().instructions, 6);
        assert_eq!(
            layout.network_fee(5000, 2_039_280).unwrap(),
            FeeAmount::new(15_000, 2_039_280)
        );
        assert_eq!(layout.additional_payback_fee(2_039_280).unwrap(), 2_039_280);
    }

    #[test]
    fn test_split_moves_creations_to_setup() {
        let layout = SwapLayout::plan(
            RouteShape {
                native_source: true,
                transit_creations: 1,
                destination_creation: true,
                ..shape(2)
            },
            7,
        )
        .unwrap();
        assert!(layout.split);
        assert_eq!(
            layout.transactions(),
            vec![
                TransactionShape {
                    instructions: 2,
                    signatures: 1,
                    account_creations: 2,
                },
                TransactionShape {
                    instructions: 6,
                    signatures: 3,
                    account_creations: 0,
                },
            ]
        );
        assert_eq!(
            layout.network_fee(5000, 100).unwrap(),
            FeeAmount::new(20_000, 200)
        );
    }

    #[test]
    fn test_too_large_without_anything_to_move() {
        let err = SwapLayout::plan(
            RouteShape {
                native_source: true,
                native_destination: true,
                ..shape(1)
            },
            7,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SwapError::TransactionTooLarge {
                instructions: 8,
                limit: 7
            }
        ));
    }

    #[test]
    fn test_limit_is_configurable() {
        let route = RouteShape {
            transit_creations: 1,
            ..shape(2)
        };
        assert!(!SwapLayout::plan(route, 3).unwrap().split);
        assert!(SwapLayout::plan(route, 2).unwrap().split);
        assert!(SwapLayout::plan(route, 1).is_err());
    }

    #[test]
    fn test_empty_route() {
        assert!(matches!(
            SwapLayout::plan(shape(0), 7),
            Err(SwapError::EmptyRoute)
        ));
    }
}
