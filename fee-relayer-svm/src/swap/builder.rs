//! Swap transaction assembly.
//!
//! Instruction order inside the swap transaction:
//!
//! 1. transit and destination token account creation, unless moved into a
//!    setup transaction
//! 2. native SOL source wrapping
//! 3. native SOL destination account creation
//! 4. one swap per pool, in pool order
//! 5. native SOL destination unwrapping
//! 6. native SOL source account close
//!
//! Every account is created before the first instruction that touches it.

use fee_relayer::FeeError;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use solana_instruction::Instruction;
use solana_keypair::Keypair;
use solana_message::Hash;
use solana_pubkey::Pubkey;
use solana_signer::Signer;

use super::calculator::{DEFAULT_MAX_INSTRUCTIONS_PER_TRANSACTION, validate_slippage};
use super::layout::{RouteShape, SwapLayout};
use super::pool::PoolsPair;
use super::transaction::PreparedTransaction;
use crate::error::SwapError;
use crate::token::{self, NATIVE_MINT, TokenAccount};

/// Inputs of a swap transaction.
#[derive(Debug, Clone, Copy)]
pub struct SwapTransactionRequest<'a> {
    /// Wallet performing the swap.
    pub user_account: Pubkey,
    /// Route, in swap order.
    pub pools: &'a PoolsPair,
    /// Amount of the source token to spend.
    pub input_amount: u64,
    /// Tolerated shortfall of the final output, in `[0, 1)`.
    pub slippage: Decimal,
    /// Account spent from. The wallet's own address with the native mint
    /// means native SOL.
    pub source_token_account: TokenAccount,
    /// Mint to receive.
    pub destination_token_mint: Pubkey,
    /// Existing destination token account, `None` to create one.
    pub destination_token_address: Option<Pubkey>,
    /// Token accounts the user already holds for intermediate mints.
    pub transit_token_accounts: &'a [TokenAccount],
    /// Blockhash the transactions are bound to.
    pub blockhash: Hash,
}

/// Transactions of a swap in execution order.
#[derive(Debug)]
pub struct SwapTransactionOutput {
    /// Setup transaction first when split, then the swap transaction.
    pub transactions: Vec<PreparedTransaction>,
    /// Rent of ephemeral wrapped SOL accounts, returned to the owner on
    /// close and therefore charged back on top of the expected fees.
    pub additional_payback_fee: u64,
}

/// Builds swap transactions for the relay to countersign.
pub trait SwapTransactionBuilder {
    /// Assembles the transactions for `request`. Nothing is signed or sent.
    ///
    /// # Errors
    ///
    /// Returns [`SwapError`] if the request is invalid or cannot be laid out.
    fn build_swap_transaction(
        &self,
        request: &SwapTransactionRequest<'_>,
    ) -> Result<SwapTransactionOutput, SwapError>;
}

/// Builder for token-swap pools with the relay as fee payer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultSwapTransactionBuilder {
    /// Relay fee payer.
    pub fee_payer: Pubkey,
    /// Network fee per signature.
    pub lamports_per_signature: u64,
    /// Rent-exempt minimum of a token account.
    pub minimum_token_account_balance: u64,
    /// Instruction limit before account creation moves to a setup transaction.
    pub max_instructions_per_transaction: usize,
}

impl DefaultSwapTransactionBuilder {
    /// Creates a builder with the default instruction limit.
    #[must_use]
    pub const fn new(
        fee_payer: Pubkey,
        lamports_per_signature: u64,
        minimum_token_account_balance: u64,
    ) -> Self {
        Self {
            fee_payer,
            lamports_per_signature,
            minimum_token_account_balance,
            max_instructions_per_transaction: DEFAULT_MAX_INSTRUCTIONS_PER_TRANSACTION,
        }
    }

    /// Overrides the per-transaction instruction limit.
    #[must_use]
    pub const fn with_max_instructions_per_transaction(mut self, max: usize) -> Self {
        self.max_instructions_per_transaction = max;
        self
    }
}

/// Amounts of one hop.
#[derive(Debug, Clone, Copy)]
struct Hop {
    amount_in: u64,
    minimum_amount_out: u64,
}

/// Runs the route forward, keeping intermediate estimates as minimums and
/// applying slippage to the final output only.
fn quote_hops(
    pools: &PoolsPair,
    mints: &[Pubkey],
    input_amount: u64,
    slippage: Decimal,
) -> Result<Vec<Hop>, SwapError> {
    let mut hops = Vec::with_capacity(pools.len());
    let mut amount_in = input_amount;
    for (hop, pool) in pools.iter().enumerate() {
        let estimate = pool
            .estimated_amount_out(&mints[hop], amount_in)?
            .filter(|out| *out > 0)
            .ok_or(SwapError::InsufficientLiquidity { hop })?;
        hops.push(Hop {
            amount_in,
            minimum_amount_out: estimate,
        });
        amount_in = estimate;
    }
    if let Some(last) = hops.last_mut() {
        last.minimum_amount_out = (Decimal::from(last.minimum_amount_out) * (Decimal::ONE - slippage))
            .floor()
            .to_u64()
            .ok_or(FeeError::ArithmeticOverflow)?;
    }
    Ok(hops)
}

/// Resolves the user's token account for each intermediate mint, creating
/// associated token accounts for mints the user does not hold yet.
///
/// Returns the account per intermediate mint and the mints to create.
fn resolve_transit_accounts(
    owner: &Pubkey,
    intermediate_mints: &[Pubkey],
    held: &[TokenAccount],
) -> (Vec<Pubkey>, Vec<Pubkey>) {
    let mut accounts = Vec::with_capacity(intermediate_mints.len());
    let mut to_create: Vec<Pubkey> = Vec::new();
    for mint in intermediate_mints {
        if let Some(existing) = held.iter().find(|a| a.mint == *mint && a.owner == *owner) {
            accounts.push(existing.address);
        } else {
            if !to_create.contains(mint) {
                to_create.push(*mint);
            }
            accounts.push(token::associated_token_address(owner, mint));
        }
    }
    (accounts, to_create)
}

impl SwapTransactionBuilder for DefaultSwapTransactionBuilder {
    #[cfg_attr(
        feature = "telemetry",
        tracing::instrument(
            skip_all,
            fields(
                owner = %request.user_account,
                pools = request.pools.len(),
                input_amount = request.input_amount,
            ),
            err
        )
    )]
    fn build_swap_transaction(
        &self,
        request: &SwapTransactionRequest<'_>,
    ) -> Result<SwapTransactionOutput, SwapError> {
        let owner = request.user_account;
        let pools = request.pools;
        let source = request.source_token_account;

        if pools.is_empty() {
            return Err(SwapError::EmptyRoute);
        }
        if let Some(mint) = pools.iter().find_map(super::pool::SwapPool::unsupported_mint) {
            return Err(SwapError::UnsupportedMint(mint));
        }
        if source.owner != owner {
            return Err(SwapError::SourceOwnerMismatch {
                owner: source.owner,
                user: owner,
            });
        }
        if source.balance < request.input_amount {
            return Err(SwapError::MissingSourceAccount {
                balance: source.balance,
                required: request.input_amount,
            });
        }
        let mints = pools
            .mints(&source.mint)
            .ok_or_else(|| SwapError::InvalidRoute(format!("pools do not connect {}", source.mint)))?;
        if mints.last() != Some(&request.destination_token_mint) {
            return Err(SwapError::InvalidRoute(format!(
                "route does not end in {}",
                request.destination_token_mint
            )));
        }
        validate_slippage(request.slippage)?;
        let hops = quote_hops(pools, &mints, request.input_amount, request.slippage)?;

        let native_source = source.is_native_sol();
        let native_destination = request.destination_token_mint == NATIVE_MINT;
        let rent = self.minimum_token_account_balance;

        let source_wrapper = native_source.then(Keypair::new);
        let destination_wrapper = native_destination.then(Keypair::new);

        let (transit_accounts, transit_mints_to_create) =
            resolve_transit_accounts(&owner, &mints[1..mints.len() - 1], request.transit_token_accounts);

        let destination_to_create = match (&destination_wrapper, request.destination_token_address) {
            (Some(_), _) | (None, Some(_)) => None,
            (None, None) => Some(request.destination_token_mint),
        };

        let layout = SwapLayout::plan(
            RouteShape {
                hops: pools.len(),
                native_source,
                native_destination,
                transit_creations: transit_mints_to_create.len(),
                destination_creation: destination_to_create.is_some(),
            },
            self.max_instructions_per_transaction,
        )?;

        let creations: Vec<Instruction> = transit_mints_to_create
            .iter()
            .chain(destination_to_create.iter())
            .map(|mint| token::create_associated_token_account(&self.fee_payer, &owner, mint))
            .collect();

        let source_address = source_wrapper.as_ref().map_or(source.address, Signer::pubkey);
        let destination_address = match (&destination_wrapper, request.destination_token_address) {
            (Some(wrapper), _) => wrapper.pubkey(),
            (None, Some(address)) => address,
            (None, None) => token::associated_token_address(&owner, &request.destination_token_mint),
        };

        let mut transactions = Vec::with_capacity(2);
        let mut instructions = Vec::with_capacity(layout.swap().instructions);
        if let Some(setup) = layout.setup() {
            transactions.push(PreparedTransaction {
                instructions: creations,
                signers: Vec::new(),
                fee_payer: self.fee_payer,
                recent_blockhash: request.blockhash,
                expected_fee: setup.expected_fee(self.lamports_per_signature, rent)?,
            });
        } else {
            instructions.extend(creations);
        }

        if source_wrapper.is_some() {
            let lamports = request
                .input_amount
                .checked_add(rent)
                .ok_or(FeeError::ArithmeticOverflow)?;
            instructions.push(solana_system_interface::instruction::transfer(
                &owner,
                &self.fee_payer,
                request.input_amount,
            ));
            instructions.push(token::create_token_account(&self.fee_payer, &source_address, lamports));
            instructions.push(token::initialize_account(&source_address, &NATIVE_MINT, &owner)?);
        }
        if destination_wrapper.is_some() {
            instructions.push(token::create_token_account(&self.fee_payer, &destination_address, rent));
            instructions.push(token::initialize_account(&destination_address, &NATIVE_MINT, &owner)?);
        }

        for (index, (pool, hop)) in pools.iter().zip(&hops).enumerate() {
            let user_source = if index == 0 {
                source_address
            } else {
                transit_accounts[index - 1]
            };
            let user_destination = transit_accounts
                .get(index)
                .copied()
                .unwrap_or(destination_address);
            let swap = pool
                .swap_instruction(
                    &mints[index],
                    &user_source,
                    &user_destination,
                    &owner,
                    hop.amount_in,
                    hop.minimum_amount_out,
                )
                .ok_or_else(|| SwapError::InvalidRoute(format!("pool {} does not hold {}", pool.account, mints[index])))?;
            instructions.push(swap);
        }

        if destination_wrapper.is_some() {
            instructions.push(token::close_account(&destination_address, &owner, &owner)?);
        }
        if source_wrapper.is_some() {
            instructions.push(token::close_account(&source_address, &owner, &owner)?);
        }
        debug_assert_eq!(instructions.len(), layout.swap().instructions);

        transactions.push(PreparedTransaction {
            instructions,
            signers: source_wrapper.into_iter().chain(destination_wrapper).collect(),
            fee_payer: self.fee_payer,
            recent_blockhash: request.blockhash,
            expected_fee: layout.swap().expected_fee(self.lamports_per_signature, rent)?,
        });

        let additional_payback_fee = layout.additional_payback_fee(rent)?;

        #[cfg(feature = "telemetry")]
        tracing::debug!(
            transactions = transactions.len(),
            additional_payback_fee,
            "Built swap transactions"
        );

        Ok(SwapTransactionOutput {
            transactions,
            additional_payback_fee,
        })
    }
}
