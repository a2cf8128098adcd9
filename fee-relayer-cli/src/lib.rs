//! Command line client for the fee relayer API.
//!
//! # Modules
//!
//! - [`commands`]: subcommands and their execution
//! - [`config`]: TOML configuration with environment variable expansion
//! - [`error`]: command errors

pub mod commands;
pub mod config;
pub mod error;

pub use commands::{Args, Command, run};
pub use config::CliConfig;
pub use error::CliError;
