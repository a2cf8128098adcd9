//! Token-swap pool model and constant-product quotes.

use fee_relayer::FeeError;
use solana_instruction::{AccountMeta, Instruction};
use solana_pubkey::Pubkey;

use crate::error::SwapError;

/// One side of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolToken {
    /// Token mint.
    pub mint: Pubkey,
    /// Pool vault holding the token.
    pub vault: Pubkey,
    /// Current vault balance.
    pub reserve: u64,
    /// Mint decimals, if known.
    pub decimals: Option<u8>,
}

/// A token-swap pool supplied by the routing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapPool {
    /// Swap program owning the pool.
    pub program_id: Pubkey,
    /// Pool state account.
    pub account: Pubkey,
    /// Pool authority PDA.
    pub authority: Pubkey,
    /// First token.
    pub token_a: PoolToken,
    /// Second token.
    pub token_b: PoolToken,
    /// Pool LP token mint.
    pub pool_token_mint: Pubkey,
    /// Pool fee account.
    pub fee_account: Pubkey,
    /// Trading fee numerator.
    pub fee_numerator: u64,
    /// Trading fee denominator.
    pub fee_denominator: u64,
}

impl SwapPool {
    /// Returns `(input, output)` sides for a swap that spends `input_mint`.
    #[must_use]
    pub fn sides(&self, input_mint: &Pubkey) -> Option<(&PoolToken, &PoolToken)> {
        if self.token_a.mint == *input_mint {
            Some((&self.token_a, &self.token_b))
        } else if self.token_b.mint == *input_mint {
            Some((&self.token_b, &self.token_a))
        } else {
            None
        }
    }

    /// Mint received when spending `input_mint`.
    #[must_use]
    pub fn output_mint(&self, input_mint: &Pubkey) -> Option<Pubkey> {
        self.sides(input_mint).map(|(_, output)| output.mint)
    }

    /// Mint without known decimals, if any.
    #[must_use]
    pub fn unsupported_mint(&self) -> Option<Pubkey> {
        [self.token_a, self.token_b]
            .into_iter()
            .find(|token| token.decimals.is_none())
            .map(|token| token.mint)
    }

    /// Share of the input kept after the trading fee, as `(kept, denominator)`.
    ///
    /// A zero denominator means the pool charges no fee.
    fn fee_ratio(&self) -> Result<(u128, u128), SwapError> {
        if self.fee_denominator == 0 {
            return Ok((1, 1));
        }
        let kept = self
            .fee_denominator
            .checked_sub(self.fee_numerator)
            .ok_or(SwapError::InvalidPoolFee {
                pool: self.account,
                numerator: self.fee_numerator,
                denominator: self.fee_denominator,
            })?;
        Ok((u128::from(kept), u128::from(self.fee_denominator)))
    }

    /// Quote for spending `amount_in` of `input_mint`. The trading fee is
    /// taken from the input, rounded down, before the constant-product curve
    /// is applied.
    ///
    /// Returns `Ok(None)` if the mint is not in the pool.
    ///
    /// # Errors
    ///
    /// Returns [`SwapError::InvalidPoolFee`] for a fee above 100% and
    /// [`SwapError::Fee`] on overflow.
    pub fn estimated_amount_out(
        &self,
        input_mint: &Pubkey,
        amount_in: u64,
    ) -> Result<Option<u64>, SwapError> {
        let Some((input, output)) = self.sides(input_mint) else {
            return Ok(None);
        };
        let (kept, denominator) = self.fee_ratio()?;
        let amount_in = u128::from(amount_in);
        let fee = amount_in
            .checked_mul(denominator - kept)
            .ok_or(FeeError::ArithmeticOverflow)?
            / denominator;
        let after_fee = amount_in - fee;
        let reserve_after = u128::from(input.reserve)
            .checked_add(after_fee)
            .ok_or(FeeError::ArithmeticOverflow)?;
        if reserve_after == 0 {
            return Ok(Some(0));
        }
        let out = u128::from(output.reserve)
            .checked_mul(after_fee)
            .ok_or(FeeError::ArithmeticOverflow)?
            / reserve_after;
        Ok(Some(u64::try_from(out).map_err(|_| FeeError::ArithmeticOverflow)?))
    }

    /// Smallest input that yields at least `amount_out` of `output_mint`.
    ///
    /// Returns `Ok(None)` if the mint is not in the pool or the pool cannot
    /// pay `amount_out`.
    ///
    /// # Errors
    ///
    /// Returns [`SwapError::InvalidPoolFee`] for a fee above 100% and
    /// [`SwapError::Fee`] if the input does not fit in `u64`.
    pub fn required_amount_in(
        &self,
        output_mint: &Pubkey,
        amount_out: u64,
    ) -> Result<Option<u64>, SwapError> {
        let Some((output, input)) = self.sides(output_mint) else {
            return Ok(None);
        };
        let (kept, denominator) = self.fee_ratio()?;
        if amount_out >= output.reserve || kept == 0 {
            return Ok(None);
        }
        let amount_out = u128::from(amount_out);
        let after_fee = u128::from(input.reserve)
            .checked_mul(amount_out)
            .ok_or(FeeError::ArithmeticOverflow)?
            .div_ceil(u128::from(output.reserve) - amount_out);
        let amount_in = after_fee
            .checked_mul(denominator)
            .ok_or(FeeError::ArithmeticOverflow)?
            .div_ceil(kept);
        Ok(Some(u64::try_from(amount_in).map_err(|_| FeeError::ArithmeticOverflow)?))
    }

    /// Token-swap `Swap` instruction spending `user_source` into `user_destination`.
    ///
    /// Returns `None` if `source_mint` is not in the pool.
    #[must_use]
    pub fn swap_instruction(
        &self,
        source_mint: &Pubkey,
        user_source: &Pubkey,
        user_destination: &Pubkey,
        user_authority: &Pubkey,
        amount_in: u64,
        minimum_amount_out: u64,
    ) -> Option<Instruction> {
        let (input, output) = self.sides(source_mint)?;
        let mut data = Vec::with_capacity(17);
        data.push(1);
        data.extend_from_slice(&amount_in.to_le_bytes());
        data.extend_from_slice(&minimum_amount_out.to_le_bytes());
        Some(Instruction {
            program_id: self.program_id,
            accounts: vec![
                AccountMeta::new_readonly(self.account, false),
                AccountMeta::new_readonly(self.authority, false),
                AccountMeta::new_readonly(*user_authority, true),
                AccountMeta::new(*user_source, false),
                AccountMeta::new(input.vault, false),
                AccountMeta::new(output.vault, false),
                AccountMeta::new(*user_destination, false),
                AccountMeta::new(self.pool_token_mint, false),
                AccountMeta::new(self.fee_account, false),
                AccountMeta::new_readonly(spl_token::ID, false),
            ],
            data,
        })
    }
}

/// Ordered pools of a route, direct (one pool) or through intermediate mints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolsPair(pub Vec<SwapPool>);

impl PoolsPair {
    /// Wraps an ordered route.
    #[must_use]
    pub const fn new(pools: Vec<SwapPool>) -> Self {
        Self(pools)
    }

    /// Number of hops.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the route has no pools.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pools in swap order.
    pub fn iter(&self) -> std::slice::Iter<'_, SwapPool> {
        self.0.iter()
    }

    /// Mints visited when starting from `source_mint`: the source, every
    /// intermediate mint and the final output.
    ///
    /// Returns `None` at the first pool that does not hold the running mint.
    #[must_use]
    pub fn mints(&self, source_mint: &Pubkey) -> Option<Vec<Pubkey>> {
        let mut mints = Vec::with_capacity(self.len() + 1);
        mints.push(*source_mint);
        let mut current = *source_mint;
        for pool in self.iter() {
            current = pool.output_mint(&current)?;
            mints.push(current);
        }
        Some(mints)
    }
}

impl<'a> IntoIterator for &'a PoolsPair {
    type Item = &'a SwapPool;
    type IntoIter = std::slice::Iter<'a, SwapPool>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
