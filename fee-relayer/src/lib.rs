#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for Solana fee relayer clients.
//!
//! A fee relay pays the network fee of a user's transaction and is paid back
//! in a token the user holds. This crate holds the chain-agnostic parts of a
//! relay client: fee amounts, the free-tier decision, the relay wire formats
//! and the API boundary. Solana transaction assembly lives in
//! `fee-relayer-svm`, the HTTP transport in `fee-relayer-http`.
//!
//! # Modules
//!
//! - [`api`] - Relay API trait and its wire types
//! - [`config`] - Client configuration
//! - [`context`] - Relay context and its store
//! - [`encoding`] - Base64 helpers
//! - [`envelope`] - Signed transaction + statistics envelope
//! - [`error`] - Relay error responses
//! - [`fee`] - Fee amounts
//! - [`stats`] - Statistics attached to relayed transactions
//! - [`top_up`] - Relay account top-up calculation
//! - [`usage`] - Free-tier usage decision
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation

pub mod api;
pub mod config;
pub mod context;
pub mod encoding;
pub mod envelope;
pub mod error;
pub mod fee;
pub mod stats;
pub mod top_up;
pub mod usage;

pub use api::FeeRelayerApi;
pub use envelope::{EnvelopeError, RelayEnvelope};
pub use error::FeeRelayerError;
pub use fee::{FeeAmount, FeeError};
pub use stats::StatsInfo;
pub use usage::UsageStatus;
