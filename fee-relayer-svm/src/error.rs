//! Errors raised while quoting or assembling swap transactions.

use fee_relayer::FeeError;
use rust_decimal::Decimal;
use solana_pubkey::Pubkey;

/// Errors from the swap fee calculator and transaction builder.
#[derive(Debug, thiserror::Error)]
pub enum SwapError {
    /// No swap pool was supplied.
    #[error("Swap route is empty")]
    EmptyRoute,
    /// The source token account cannot cover the input amount.
    #[error("Source account holds {balance}, swap needs {required}")]
    MissingSourceAccount {
        /// Balance of the source account.
        balance: u64,
        /// Requested input amount.
        required: u64,
    },
    /// The source token account belongs to another wallet.
    #[error("Source account is owned by {owner}, not by {user}")]
    SourceOwnerMismatch {
        /// Owner of the source account.
        owner: Pubkey,
        /// Wallet performing the swap.
        user: Pubkey,
    },
    /// A pool token has no known decimals.
    #[error("Unsupported mint: {0}")]
    UnsupportedMint(Pubkey),
    /// The pools do not connect the source mint to the destination mint.
    #[error("Invalid swap route: {0}")]
    InvalidRoute(String),
    /// Slippage outside `[0, 1)`.
    #[error("Invalid slippage: {0}")]
    InvalidSlippage(Decimal),
    /// A pool cannot produce or absorb the requested amount.
    #[error("Insufficient liquidity at hop {hop}")]
    InsufficientLiquidity {
        /// Zero-based pool index.
        hop: usize,
    },
    /// A pool charges a trading fee above 100%.
    #[error("Pool {pool} charges {numerator}/{denominator} trading fee")]
    InvalidPoolFee {
        /// Pool state account.
        pool: Pubkey,
        /// Fee numerator.
        numerator: u64,
        /// Fee denominator.
        denominator: u64,
    },
    /// The swap instructions alone exceed the per-transaction limit.
    #[error("Swap needs {instructions} instructions, limit is {limit}")]
    TransactionTooLarge {
        /// Instructions the swap transaction would carry.
        instructions: usize,
        /// Configured limit.
        limit: usize,
    },
    /// Fee arithmetic failed.
    #[error(transparent)]
    Fee(#[from] FeeError),
    /// A token program instruction could not be built.
    #[error("Can not build instruction: {0}")]
    Instruction(String),
    /// The transaction could not be compiled or signed.
    #[error("Can not sign transaction: {0}")]
    Signing(String),
}
