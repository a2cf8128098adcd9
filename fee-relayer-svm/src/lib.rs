#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Solana support for fee relayer clients.
//!
//! This crate assembles swap transactions whose network fee is paid by a
//! relay, quotes what the relay has to be compensated for, and moves signed
//! transactions in and out of the relay envelope.
//!
//! # Modules
//!
//! - [`swap`] - Pools, fee calculator, transaction builder
//! - [`token`] - Associated token accounts and wrapped SOL
//! - [`envelope`] - Relay envelope codec for Solana transactions
//! - [`error`] - Swap errors
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation
//!
//! # Example
//!
//! ```rust
//! use fee_relayer_svm::swap::{DefaultSwapFeeRelayerCalculator, SwapFeeRelayerCalculator};
//! use fee_relayer_svm::token::NATIVE_MINT;
//! use solana_pubkey::pubkey;
//!
//! let usdt = pubkey!("Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB");
//! let fee = DefaultSwapFeeRelayerCalculator::default()
//!     .calculate_swapping_network_fees(5000, 2_039_280, 1, &NATIVE_MINT, &usdt, None)
//!     .unwrap();
//! assert_eq!(fee.transaction_fee, 15_000);
//! assert_eq!(fee.account_creation_fee, 2_039_280);
//! ```

pub mod envelope;
pub mod error;
pub mod swap;
pub mod token;

pub use envelope::{decode_transaction, encode_transaction};
pub use error::SwapError;
pub use swap::{
    DefaultSwapFeeRelayerCalculator, DefaultSwapTransactionBuilder, PoolsPair, PreparedTransaction,
    SwapFeeRelayerCalculator, SwapTransactionBuilder,
};
pub use token::TokenAccount;
