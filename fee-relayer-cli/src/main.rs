//! Fee relayer command line client.
//!
//! # Usage
//!
//! ```bash
//! # Relay fee payer
//! cargo run -p fee-relayer-cli -- fee-payer
//!
//! # Offline swap fee quote
//! cargo run -p fee-relayer-cli -- swap-fee --pools 2 \
//!     --source So11111111111111111111111111111111111111112 \
//!     --destination Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB
//!
//! # Configure logging level
//! RUST_LOG=debug cargo run -p fee-relayer-cli -- fee-payer
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG`: path to the TOML configuration file (default: `fee-relayer.toml`)
//! - `FEE_RELAYER_URL`: overrides the relay base URL
//! - `RUST_LOG`: log level filter (default: `info`)

use clap::Parser;
use tracing_subscriber::EnvFilter;

use fee_relayer_cli::{Args, CliConfig, CliError, run};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if let Err(e) = execute(args).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn execute(args: Args) -> Result<(), CliError> {
    let config = match &args.config {
        Some(path) => CliConfig::load_from(&path.to_string_lossy())?,
        None => CliConfig::load()?,
    };
    if args.command.is_remote() {
        tracing::info!(endpoint = %config.relayer.endpoint(), "Querying relay");
    }

    let output = run(args.command, &config).await?;
    emit(&serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[allow(clippy::print_stdout)]
fn emit(output: &str) {
    println!("{output}");
}
