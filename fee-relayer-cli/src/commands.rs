//! Subcommands and their execution.

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use fee_relayer::FeeAmount;
use fee_relayer::api::{FeeRelayerApi, RelayRequest};
use fee_relayer::context::RelayAccountStatus;
use fee_relayer::encoding::Base64Bytes;
use fee_relayer::envelope::RelayEnvelope;
use fee_relayer::stats::OperationType;
use fee_relayer::top_up::{DefaultRelayFeeCalculator, RelayFeeCalculator};
use fee_relayer_svm::swap::{DefaultSwapFeeRelayerCalculator, SwapFeeQuery, SwapFeeRelayerCalculator};
use fee_relayer_svm::decode_transaction;
use serde_json::{Value, json};
use solana_pubkey::Pubkey;

use crate::config::CliConfig;
use crate::error::CliError;

/// Command line client for the fee relayer API.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file.
    #[arg(long, env = "CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the relay fee payer address
    FeePayer,

    /// Print the free-tier counters of an account
    FreeFeeLimits {
        /// Account address
        authority: String,

        /// Fee to test against the free tier, defaults to one signature
        #[arg(long)]
        transaction_fee: Option<u64>,
    },

    /// Print metadata of a fee token
    FeeToken {
        /// Mint address
        mint: String,
    },

    /// Quote the network fee and rent the relay fronts for a swap
    SwapFee {
        /// Number of pools on the route
        #[arg(long, default_value_t = 1)]
        pools: usize,

        /// Mint spent, the native mint for SOL
        #[arg(long)]
        source: String,

        /// Mint received
        #[arg(long)]
        destination: String,

        /// Existing destination token account
        #[arg(long)]
        destination_address: Option<String>,

        /// Intermediate token accounts already held
        #[arg(long, default_value_t = 0)]
        existing_transit: usize,
    },

    /// Decode a relay envelope read from a file, or stdin when omitted
    DecodeEnvelope {
        /// Envelope JSON file
        path: Option<PathBuf>,
    },

    /// Submit a base64 signed transaction read from a file, or stdin when omitted
    Relay {
        /// Transaction file
        path: Option<PathBuf>,

        /// Operation reported with the transaction
        #[arg(long, value_parser = parse_operation_type, default_value = "Other")]
        operation: OperationType,

        /// Currency reported with the transaction
        #[arg(long)]
        currency: Option<String>,

        /// Only collect the fee payer signature instead of broadcasting
        #[arg(long)]
        sign_only: bool,
    },

    /// Compute the lamports to top up the relay account with
    TopUp {
        /// Account address
        authority: String,

        /// Current relay account balance, omitted when the account does not exist
        #[arg(long)]
        relay_balance: Option<u64>,

        /// Network fee of the relayed transaction
        #[arg(long, default_value_t = 0)]
        transaction_fee: u64,

        /// Rent of accounts the relayed transaction creates
        #[arg(long, default_value_t = 0)]
        account_creation_fee: u64,

        /// Mint the fee is paid with
        #[arg(long)]
        paying_mint: Option<String>,
    },
}

impl Command {
    /// Whether the command talks to the relay.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::FeePayer
                | Self::FreeFeeLimits { .. }
                | Self::FeeToken { .. }
                | Self::Relay { .. }
                | Self::TopUp { .. }
        )
    }
}

fn parse_operation_type(value: &str) -> Result<OperationType, String> {
    serde_json::from_value(Value::String(value.to_owned()))
        .map_err(|_| format!("unknown operation type {value:?}"))
}

fn read_input(path: Option<PathBuf>) -> Result<String, CliError> {
    Ok(match path {
        Some(path) => std::fs::read_to_string(path)?,
        None => std::io::read_to_string(std::io::stdin())?,
    })
}

fn parse_pubkey(value: &str) -> Result<Pubkey, CliError> {
    Pubkey::from_str(value.trim()).map_err(|_| CliError::InvalidPubkey(value.to_owned()))
}

/// Runs `command` and returns its JSON output.
///
/// # Errors
///
/// Returns [`CliError`] if an argument is invalid or the relay request fails.
pub async fn run(command: Command, config: &CliConfig) -> Result<Value, CliError> {
    match command {
        Command::FeePayer => {
            let fee_payer = config.client()?.get_fee_payer_pubkey().await?;
            Ok(json!({ "fee_payer": fee_payer }))
        }
        Command::FreeFeeLimits {
            authority,
            transaction_fee,
        } => {
            let authority = parse_pubkey(&authority)?.to_string();
            let usage = FeeRelayerApi::get_free_fee_limits(&config.client()?, &authority).await?;
            let fee = transaction_fee.unwrap_or(config.relayer.lamports_per_signature);
            Ok(json!({
                "usage": usage,
                "transaction_fee": fee,
                "free_transaction_fee_available": usage.is_free_transaction_fee_available(fee),
            }))
        }
        Command::FeeToken { mint } => {
            let mint = parse_pubkey(&mint)?.to_string();
            let data = config.client()?.fee_token_data(&mint).await?;
            Ok(serde_json::to_value(data)?)
        }
        Command::SwapFee {
            pools,
            source,
            destination,
            destination_address,
            existing_transit,
        } => {
            let source = parse_pubkey(&source)?;
            let destination = parse_pubkey(&destination)?;
            let destination_address = destination_address
                .as_deref()
                .map(parse_pubkey)
                .transpose()?;
            swap_fee(config, pools, &source, &destination, destination_address.as_ref(), existing_transit)
        }
        Command::DecodeEnvelope { path } => decode_envelope(&read_input(path)?),
        Command::Relay {
            path,
            operation,
            currency,
            sign_only,
        } => relay(config, &read_input(path)?, operation, currency, sign_only).await,
        Command::TopUp {
            authority,
            relay_balance,
            transaction_fee,
            account_creation_fee,
            paying_mint,
        } => {
            let authority = parse_pubkey(&authority)?.to_string();
            let paying_mint = paying_mint
                .as_deref()
                .map(parse_pubkey)
                .transpose()?
                .map(|mint| mint.to_string());
            let status = relay_balance.map_or(RelayAccountStatus::NotYetCreated, |balance| {
                RelayAccountStatus::Created { balance }
            });
            let expected_fee = FeeAmount::new(transaction_fee, account_creation_fee);
            top_up(config, &authority, status, expected_fee, paying_mint.as_deref()).await
        }
    }
}

async fn relay(
    config: &CliConfig,
    transaction: &str,
    operation: OperationType,
    currency: Option<String>,
    sign_only: bool,
) -> Result<Value, CliError> {
    let info = config.relayer.stats_info(operation);
    let info = match currency {
        Some(currency) => info.with_currency(currency),
        None => info,
    };
    let envelope = RelayEnvelope {
        transaction: Base64Bytes::from(transaction.trim().to_owned()),
        info,
    };
    decode_transaction(&envelope)?;

    let request = if sign_only {
        RelayRequest::SignRelayTransaction(envelope)
    } else {
        RelayRequest::RelayTransaction(envelope)
    };
    let response = config.client()?.send_transaction(&request).await?;
    Ok(json!({ "signature": response.signature() }))
}

async fn top_up(
    config: &CliConfig,
    authority: &str,
    relay_account_status: RelayAccountStatus,
    expected_fee: FeeAmount,
    paying_mint: Option<&str>,
) -> Result<Value, CliError> {
    let client = config.client()?;
    let fee_payer = client.get_fee_payer_pubkey().await?;
    let usage = FeeRelayerApi::get_free_fee_limits(&client, authority).await?;
    let context = config.relayer.relay_context(fee_payer, relay_account_status, usage);
    let amount = DefaultRelayFeeCalculator.calculate_needed_top_up_amount(&context, expected_fee, paying_mint)?;
    Ok(json!({
        "fee_payer": context.fee_payer_address,
        "transaction_fee": amount.transaction_fee,
        "account_creation_fee": amount.account_creation_fee,
        "total": amount.total()?,
    }))
}

fn swap_fee(
    config: &CliConfig,
    pools: usize,
    source: &Pubkey,
    destination: &Pubkey,
    destination_address: Option<&Pubkey>,
    existing_transit: usize,
) -> Result<Value, CliError> {
    let relayer = &config.relayer;
    let calculator = DefaultSwapFeeRelayerCalculator::new(relayer.max_instructions_per_transaction);
    let fee = calculator.calculate_fees(&SwapFeeQuery {
        lamports_per_signature: relayer.lamports_per_signature,
        minimum_token_account_balance: relayer.minimum_token_account_balance,
        swap_pools_count: pools,
        source_token_mint: source,
        destination_token_mint: destination,
        destination_address,
        existing_transit_accounts: existing_transit,
    })?;
    let total = fee.total().map_err(fee_relayer_svm::SwapError::from)?;
    Ok(json!({
        "transaction_fee": fee.transaction_fee,
        "account_creation_fee": fee.account_creation_fee,
        "total": total,
    }))
}

fn decode_envelope(input: &str) -> Result<Value, CliError> {
    let envelope = RelayEnvelope::from_json(input)?;
    let (transaction, info) = decode_transaction(&envelope)?;
    let message = &transaction.message;
    Ok(json!({
        "info": info,
        "fee_payer": message.static_account_keys().first().map(ToString::to_string),
        "signatures": transaction.signatures.iter().map(ToString::to_string).collect::<Vec<_>>(),
        "instructions": message.instructions().len(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use fee_relayer::stats::{DeviceType, Environment};
    use fee_relayer_svm::encode_transaction;
    use solana_keypair::Keypair;
    use solana_message::{Hash, Message, VersionedMessage};
    use solana_signer::Signer;
    use solana_transaction::versioned::VersionedTransaction;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const USDT: &str = "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB";
    const NATIVE: &str = "So11111111111111111111111111111111111111112";
    const FEE_PAYER: &str = "FG4Y3yX4AAchp1HvNZ7LfzFTewF2f6nDoMDCohTFrdpT";
    const OWNER: &str = "3h1zGmCwsRJnVk5BuRNMLsPaQu1y2aqXqXDWYCgrp5UG";

    #[test]
    fn test_args_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_swap_fee() {
        let args = Args::try_parse_from([
            "fee-relayer",
            "swap-fee",
            "--pools",
            "2",
            "--source",
            NATIVE,
            "--destination",
            USDT,
        ])
        .unwrap();
        assert!(!args.command.is_remote());
        assert_eq!(
            args.command,
            Command::SwapFee {
                pools: 2,
                source: NATIVE.to_owned(),
                destination: USDT.to_owned(),
                destination_address: None,
                existing_transit: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_swap_fee_native_to_token() {
        let command = Command::SwapFee {
            pools: 1,
            source: NATIVE.to_owned(),
            destination: USDT.to_owned(),
            destination_address: None,
            existing_transit: 0,
        };
        let output = run(command, &CliConfig::default()).await.unwrap();
        assert_eq!(output["transaction_fee"], 15_000);
        assert_eq!(output["account_creation_fee"], 2_039_280);
        assert_eq!(output["total"], 2_054_280);
    }

    #[tokio::test]
    async fn test_invalid_pubkey() {
        let command = Command::FeeToken {
            mint: "not-a-key".to_owned(),
        };
        let err = run(command, &CliConfig::default()).await.unwrap_err();
        assert!(matches!(err, CliError::InvalidPubkey(_)));
    }

    #[tokio::test]
    async fn test_fee_payer_from_relay() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fee_payer/pubkey"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FEE_PAYER))
            .mount(&server)
            .await;

        let mut config = CliConfig::default();
        config.relayer.base_url = server.uri();
        let output = run(Command::FeePayer, &config).await.unwrap();
        assert_eq!(output["fee_payer"], FEE_PAYER);
    }

    fn signed_transfer() -> String {
        let payer = Keypair::new();
        let instruction =
            solana_system_interface::instruction::transfer(&payer.pubkey(), &Keypair::new().pubkey(), 42);
        let message = Message::new_with_blockhash(&[instruction], Some(&payer.pubkey()), &Hash::default());
        let transaction = VersionedTransaction::try_new(VersionedMessage::Legacy(message), &[&payer]).unwrap();
        let info = CliConfig::default().relayer.stats_info(OperationType::Other);
        encode_transaction(&transaction, info).unwrap().transaction.to_string()
    }

    fn free_fee_limits(fee_count: u64) -> Value {
        json!({
            "authority": [1, 2, 3],
            "limits": {
                "use_free_fee": true,
                "max_fee_amount": 10_000_000,
                "max_fee_count": 100,
                "max_token_account_creation_amount": 10_000_000,
                "max_token_account_creation_count": 30,
                "period": {"secs": 86_400, "nanos": 0}
            },
            "processed_fee": {"total_fee_amount": 0, "fee_count": fee_count, "rent_count": 0}
        })
    }

    #[test]
    fn test_parse_relay() {
        let args = Args::try_parse_from(["fee-relayer", "relay", "--operation", "SendViaLink", "--sign-only"]).unwrap();
        assert!(args.command.is_remote());
        assert_eq!(
            args.command,
            Command::Relay {
                path: None,
                operation: OperationType::SendViaLink,
                currency: None,
                sign_only: true,
            }
        );
        assert!(Args::try_parse_from(["fee-relayer", "relay", "--operation", "Mint"]).is_err());
    }

    #[tokio::test]
    async fn test_relay_reports_configured_statistics() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/relay_transaction"))
            .and(body_partial_json(json!({
                "info": {
                    "operation_type": "Swap",
                    "device_type": "Android",
                    "currency": "USDT",
                    "build": "2.4.0",
                    "environment": "dev"
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"["5wHu1qwD7q5"]"#))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = CliConfig::default();
        config.relayer.base_url = server.uri();
        config.relayer.device_type = DeviceType::Android;
        config.relayer.environment = Environment::Dev;
        config.relayer.build = Some("2.4.0".to_owned());

        let output = relay(&config, &signed_transfer(), OperationType::Swap, Some("USDT".to_owned()), false)
            .await
            .unwrap();
        assert_eq!(output["signature"], "5wHu1qwD7q5");
    }

    #[tokio::test]
    async fn test_relay_rejects_malformed_transaction_before_sending() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"["5wHu1qwD7q5"]"#))
            .expect(0)
            .mount(&server)
            .await;

        let mut config = CliConfig::default();
        config.relayer.base_url = server.uri();
        let err = relay(&config, "AQID", OperationType::Transfer, None, true).await.unwrap_err();
        assert!(matches!(err, CliError::Envelope(_)));
    }

    #[tokio::test]
    async fn test_top_up_for_new_relay_account() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fee_payer/pubkey"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FEE_PAYER))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/free_fee_limits/{OWNER}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(free_fee_limits(100)))
            .mount(&server)
            .await;

        let mut config = CliConfig::default();
        config.relayer.base_url = server.uri();
        config.relayer.minimum_relay_account_balance = 1_000_000;
        let command = Command::TopUp {
            authority: OWNER.to_owned(),
            relay_balance: None,
            transaction_fee: 5000,
            account_creation_fee: 0,
            paying_mint: Some(USDT.to_owned()),
        };
        let output = run(command, &config).await.unwrap();
        assert_eq!(output["fee_payer"], FEE_PAYER);
        assert_eq!(output["transaction_fee"], 15_000);
        assert_eq!(output["account_creation_fee"], 1_000_000);
        assert_eq!(output["total"], 1_015_000);
    }

    #[tokio::test]
    async fn test_top_up_covered_by_free_tier() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fee_payer/pubkey"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FEE_PAYER))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/free_fee_limits/{OWNER}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(free_fee_limits(0)))
            .mount(&server)
            .await;

        let mut config = CliConfig::default();
        config.relayer.base_url = server.uri();
        let command = Command::TopUp {
            authority: OWNER.to_owned(),
            relay_balance: Some(0),
            transaction_fee: 5000,
            account_creation_fee: 0,
            paying_mint: None,
        };
        let output = run(command, &config).await.unwrap();
        assert_eq!(output["total"], 0);
    }

    #[test]
    fn test_decode_envelope_rejects_garbage() {
        let input = r#"{"transaction": "AQID", "info": {"operation_type": "Swap", "device_type": "Web", "environment": "dev"}}"#;
        assert!(matches!(decode_envelope(input), Err(CliError::Envelope(_))));
    }
}
