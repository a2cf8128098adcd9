//! Swap fee quotes and swap transaction assembly.
//!
//! [`SwapFeeRelayerCalculator`] quotes what the relay fronts for a swap and
//! [`SwapTransactionBuilder`] builds the matching transactions. Both derive
//! their fees from the same [`layout::SwapLayout`].

pub mod builder;
pub mod calculator;
pub mod layout;
pub mod pool;
pub mod transaction;

pub use builder::{
    DefaultSwapTransactionBuilder, SwapTransactionBuilder, SwapTransactionOutput,
    SwapTransactionRequest,
};
pub use calculator::{
    DefaultSwapFeeRelayerCalculator, SwapFeeQuery, SwapFeeRelayerCalculator,
    calculate_fee_in_paying_token,
};
pub use pool::{PoolToken, PoolsPair, SwapPool};
pub use transaction::PreparedTransaction;
