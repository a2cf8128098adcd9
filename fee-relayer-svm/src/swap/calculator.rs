//! Swap fee quotes.

use fee_relayer::{FeeAmount, FeeError};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use solana_pubkey::Pubkey;

use super::layout::{RouteShape, SwapLayout};
use super::pool::PoolsPair;
use crate::error::SwapError;
use crate::token::NATIVE_MINT;

/// Default instruction limit per transaction.
pub const DEFAULT_MAX_INSTRUCTIONS_PER_TRANSACTION: usize = 7;

/// Inputs of a swap fee quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapFeeQuery<'a> {
    /// Network fee per signature.
    pub lamports_per_signature: u64,
    /// Rent-exempt minimum of a token account.
    pub minimum_token_account_balance: u64,
    /// Pool hops of the route.
    pub swap_pools_count: usize,
    /// Mint spent. The native mint means the wallet's SOL balance.
    pub source_token_mint: &'a Pubkey,
    /// Mint received.
    pub destination_token_mint: &'a Pubkey,
    /// Existing destination token account, `None` if it must be created.
    pub destination_address: Option<&'a Pubkey>,
    /// Intermediate token accounts the user already holds.
    pub existing_transit_accounts: usize,
}

impl SwapFeeQuery<'_> {
    fn shape(&self) -> RouteShape {
        let native_destination = *self.destination_token_mint == NATIVE_MINT;
        RouteShape {
            hops: self.swap_pools_count,
            native_source: *self.source_token_mint == NATIVE_MINT,
            native_destination,
            transit_creations: self
                .swap_pools_count
                .saturating_sub(1)
                .saturating_sub(self.existing_transit_accounts),
            destination_creation: self.destination_address.is_none() && !native_destination,
        }
    }
}

/// Computes what the relay must be paid for a swap.
pub trait SwapFeeRelayerCalculator {
    /// Network fee and rent the relay fronts for the swap described by `query`.
    ///
    /// # Errors
    ///
    /// Returns [`SwapError::EmptyRoute`] for zero pools,
    /// [`SwapError::TransactionTooLarge`] if the swap cannot be laid out and
    /// [`SwapError::Fee`] on overflow.
    fn calculate_fees(&self, query: &SwapFeeQuery<'_>) -> Result<FeeAmount, SwapError>;

    /// Quote assuming no transit account exists yet.
    ///
    /// # Errors
    ///
    /// See [`SwapFeeRelayerCalculator::calculate_fees`].
    fn calculate_swapping_network_fees(
        &self,
        lamports_per_signature: u64,
        minimum_token_account_balance: u64,
        swap_pools_count: usize,
        source_token_mint: &Pubkey,
        destination_token_mint: &Pubkey,
        destination_address: Option<&Pubkey>,
    ) -> Result<FeeAmount, SwapError> {
        self.calculate_fees(&SwapFeeQuery {
            lamports_per_signature,
            minimum_token_account_balance,
            swap_pools_count,
            source_token_mint,
            destination_token_mint,
            destination_address,
            existing_transit_accounts: 0,
        })
    }
}

/// Calculator matching [`DefaultSwapTransactionBuilder`](super::DefaultSwapTransactionBuilder).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultSwapFeeRelayerCalculator {
    max_instructions_per_transaction: usize,
}

impl DefaultSwapFeeRelayerCalculator {
    /// Creates a calculator for the given per-transaction instruction limit.
    #[must_use]
    pub const fn new(max_instructions_per_transaction: usize) -> Self {
        Self {
            max_instructions_per_transaction,
        }
    }
}

impl Default for DefaultSwapFeeRelayerCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_INSTRUCTIONS_PER_TRANSACTION)
    }
}

impl SwapFeeRelayerCalculator for DefaultSwapFeeRelayerCalculator {
    #[cfg_attr(
        feature = "telemetry",
        tracing::instrument(skip_all, fields(pools = query.swap_pools_count), err)
    )]
    fn calculate_fees(&self, query: &SwapFeeQuery<'_>) -> Result<FeeAmount, SwapError> {
        let layout = SwapLayout::plan(query.shape(), self.max_instructions_per_transaction)?;
        let fee = layout.network_fee(
            query.lamports_per_signature,
            query.minimum_token_account_balance,
        )?;

        #[cfg(feature = "telemetry")]
        tracing::debug!(%fee, split = layout.split, "Calculated swap fee");

        Ok(fee)
    }
}

/// Converts a fee in lamports into the paying token along `pools`, which
/// route from `paying_mint` to the native mint. Each component is padded
/// by `slippage` and converted separately.
///
/// # Errors
///
/// - [`SwapError::InvalidSlippage`] if `slippage` is outside `[0, 1)`
/// - [`SwapError::EmptyRoute`] / [`SwapError::InvalidRoute`] if `pools`
///   do not lead from `paying_mint` to the native mint
/// - [`SwapError::InsufficientLiquidity`] if a pool cannot supply the amount
pub fn calculate_fee_in_paying_token(
    pools: &PoolsPair,
    fee_in_sol: FeeAmount,
    paying_mint: &Pubkey,
    slippage: Decimal,
) -> Result<FeeAmount, SwapError> {
    if *paying_mint == NATIVE_MINT {
        return Ok(fee_in_sol);
    }
    validate_slippage(slippage)?;
    if pools.is_empty() {
        return Err(SwapError::EmptyRoute);
    }
    let mints = pools
        .mints(paying_mint)
        .ok_or_else(|| SwapError::InvalidRoute(format!("pools do not accept {paying_mint}")))?;
    if mints.last() != Some(&NATIVE_MINT) {
        return Err(SwapError::InvalidRoute(
            "route does not end in the native mint".to_owned(),
        ));
    }

    let convert = |lamports: u64| -> Result<u64, SwapError> {
        if lamports == 0 {
            return Ok(0);
        }
        let padded = Decimal::from(lamports)
            .checked_div(Decimal::ONE - slippage)
            .and_then(|amount| amount.ceil().to_u64())
            .ok_or(FeeError::ArithmeticOverflow)?;
        pools
            .iter()
            .enumerate()
            .rev()
            .try_fold(padded, |amount_out, (hop, pool)| {
                pool.required_amount_in(&mints[hop + 1], amount_out)?
                    .ok_or(SwapError::InsufficientLiquidity { hop })
            })
    };

    Ok(FeeAmount::new(
        convert(fee_in_sol.transaction_fee)?,
        convert(fee_in_sol.account_creation_fee)?,
    ))
}

pub(crate) fn validate_slippage(slippage: Decimal) -> Result<(), SwapError> {
    if slippage.is_sign_negative() || slippage >= Decimal::ONE {
        return Err(SwapError::InvalidSlippage(slippage));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::swap::pool::tests::{key, pool};

    const LAMPORTS_PER_SIGNATURE: u64 = 5000;
    const MINIMUM_TOKEN_ACCOUNT_BALANCE: u64 = 2_039_280;

    fn quote(
        pools: usize,
        source: &Pubkey,
        destination: &Pubkey,
        destination_address: Option<&Pubkey>,
    ) -> FeeAmount {
        DefaultSwapFeeRelayerCalculator::default()
            .calculate_swapping_network_fees(
                LAMPORTS_PER_SIGNATURE,
                MINIMUM_TOKEN_ACCOUNT_BALANCE,
                pools,
                source,
                destination,
                destination_address,
            )
            .unwrap()
    }

    #[test]
    fn test_direct_swap_with_existing_accounts() {
        let (btc, eth, eth_account) = (key(1), key(2), key(3));
        assert_eq!(
            quote(1, &btc, &eth, Some(&eth_account)),
            FeeAmount::new(2 * LAMPORTS_PER_SIGNATURE, 0)
        );
    }

    #[test]
    fn test_direct_swap_creates_destination() {
        let (btc, eth) = (key(1), key(2));
        assert_eq!(
            quote(1, &btc, &eth, None),
            FeeAmount::new(2 * LAMPORTS_PER_SIGNATURE, MINIMUM_TOKEN_ACCOUNT_BALANCE)
        );
    }

    #[test]
    fn test_transit_accounts_charged_once_each() {
        let (btc, eth, eth_account) = (key(1), key(2), key(3));
        let direct = quote(1, &btc, &eth, Some(&eth_account));
        for pools in 2..=4 {
            let routed = quote(pools, &btc, &eth, Some(&eth_account));
            assert_eq!(routed.transaction_fee, direct.transaction_fee);
            assert_eq!(
                routed.account_creation_fee,
                (pools as u64 - 1) * MINIMUM_TOKEN_ACCOUNT_BALANCE
            );
        }
    }

    #[test]
    fn test_existing_transit_account_not_charged() {
        let (btc, eth, eth_account) = (key(1), key(2), key(3));
        let fee = DefaultSwapFeeRelayerCalculator::default()
            .calculate_fees(&SwapFeeQuery {
                lamports_per_signature: LAMPORTS_PER_SIGNATURE,
                minimum_token_account_balance: MINIMUM_TOKEN_ACCOUNT_BALANCE,
                swap_pools_count: 2,
                source_token_mint: &btc,
                destination_token_mint: &eth,
                destination_address: Some(&eth_account),
                existing_transit_accounts: 1,
            })
            .unwrap();
        assert_eq!(fee, FeeAmount::new(2 * LAMPORTS_PER_SIGNATURE, 0));
    }

    #[test]
    fn test_native_source_split() {
        let (btc, eth) = (key(1), key(2));
        assert_eq!(
            quote(2, &NATIVE_MINT, &btc, None),
            FeeAmount::new(4 * LAMPORTS_PER_SIGNATURE, 2 * MINIMUM_TOKEN_ACCOUNT_BALANCE)
        );
        assert_eq!(
            quote(1, &NATIVE_MINT, &eth, None),
            FeeAmount::new(3 * LAMPORTS_PER_SIGNATURE, MINIMUM_TOKEN_ACCOUNT_BALANCE)
        );
    }

    #[test]
    fn test_native_destination_charges_no_rent() {
        let btc = key(1);
        assert_eq!(
            quote(1, &btc, &NATIVE_MINT, None),
            FeeAmount::new(3 * LAMPORTS_PER_SIGNATURE, 0)
        );
    }

    #[test]
    fn test_zero_pools() {
        let (btc, eth) = (key(1), key(2));
        let err = DefaultSwapFeeRelayerCalculator::default()
            .calculate_swapping_network_fees(5000, 1, 0, &btc, &eth, None)
            .unwrap_err();
        assert!(matches!(err, SwapError::EmptyRoute));
    }

    #[test]
    fn test_fee_in_native_token_is_identity() {
        let fee = FeeAmount::new(10_000, 2_039_280);
        assert_eq!(
            calculate_fee_in_paying_token(&PoolsPair::default(), fee, &NATIVE_MINT, Decimal::new(1, 2))
                .unwrap(),
            fee
        );
    }

    #[test]
    fn test_fee_in_paying_token() {
        let usdt = key(4);
        let pools = PoolsPair::new(vec![pool(usdt, 1_000_000_000, NATIVE_MINT, 10_000_000_000)]);
        let fee = FeeAmount::new(10_000, 0);
        let converted =
            calculate_fee_in_paying_token(&pools, fee, &usdt, Decimal::ZERO).unwrap();
        assert_eq!(converted.account_creation_fee, 0);
        let out = pools.0[0]
            .estimated_amount_out(&usdt, converted.transaction_fee)
            .unwrap()
            .unwrap();
        assert!(out >= 10_000);

        let padded = calculate_fee_in_paying_token(&pools, fee, &usdt, Decimal::new(5, 1)).unwrap();
        assert!(padded.transaction_fee > converted.transaction_fee);
    }

    #[test]
    fn test_fee_in_paying_token_rejects_bad_route() {
        let (usdt, btc) = (key(4), key(5));
        let pools = PoolsPair::new(vec![pool(usdt, 1_000, btc, 1_000)]);
        let fee = FeeAmount::new(10, 0);
        assert!(matches!(
            calculate_fee_in_paying_token(&pools, fee, &usdt, Decimal::ZERO),
            Err(SwapError::InvalidRoute(_))
        ));
        assert!(matches!(
            calculate_fee_in_paying_token(&pools, fee, &usdt, Decimal::ONE),
            Err(SwapError::InvalidSlippage(_))
        ));
    }

    #[test]
    fn test_fee_in_paying_token_surfaces_pool_arithmetic() {
        let usdt = key(4);
        let mut broken = pool(usdt, 1_000_000_000, NATIVE_MINT, 10_000_000_000);
        broken.fee_numerator = broken.fee_denominator + 1;
        assert!(matches!(
            calculate_fee_in_paying_token(
                &PoolsPair::new(vec![broken]),
                FeeAmount::new(10_000, 0),
                &usdt,
                Decimal::ZERO
            ),
            Err(SwapError::InvalidPoolFee { .. })
        ));

        let deep = PoolsPair::new(vec![pool(usdt, u64::MAX, NATIVE_MINT, u64::MAX)]);
        assert!(matches!(
            calculate_fee_in_paying_token(&deep, FeeAmount::new(u64::MAX - 1, 0), &usdt, Decimal::ZERO),
            Err(SwapError::Fee(FeeError::ArithmeticOverflow))
        ));
    }
}
