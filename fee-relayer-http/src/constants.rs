//! Relay API paths, relative to the versioned base URL.

/// `GET` the relay fee payer address.
pub const FEE_PAYER_PATH: &str = "fee_payer/pubkey";

/// `GET` free-tier counters, followed by the authority address.
pub const FREE_FEE_LIMITS_PATH: &str = "free_fee_limits/";

/// `GET` fee token metadata, followed by the mint address.
pub const FEE_TOKEN_DATA_PATH: &str = "fee_token_data/";
