#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! HTTP client for the fee relayer API.
//!
//! [`FeeRelayerClient`] implements [`fee_relayer::FeeRelayerApi`] over
//! `reqwest`. Each call is a single request; retry policy is left to the
//! caller.
//!
//! # Modules
//!
//! - [`client`] - The relay client
//! - [`constants`] - Endpoint paths
//! - [`error`] - Client error types
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation

pub mod client;
pub mod constants;
pub mod error;

pub use client::FeeRelayerClient;
pub use error::FeeRelayerClientError;
