//! Relay error responses.
//!
//! The relay reports failures as `{"code": int, "message": string, "data": detail?}`
//! where `detail` is a single-key map from an error kind to its payload, for
//! example `{"ClientError": ["RPC response error -32002: ..."]}`.
//!
//! Negative codes are reserved for failures detected on the client side.

use regex::Regex;
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Quoted program log fragments inside an RPC simulation error.
static PROGRAM_LOG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(?:Program|Transfer:) [^"]+""#).expect("Invalid program log pattern")
});

const ERROR_LOG_PREFIXES: [&str; 3] = [
    "Program failed to complete: ",
    "Program log: Error: ",
    "Transfer: insufficient lamports ",
];

const CONNECTION_CLOSED: &str = "connection closed before message completed";

/// Error kind named by the relay in the `data` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    /// Blockhash could not be parsed.
    ParseHashError,
    /// Public key could not be parsed.
    ParsePubkeyError,
    /// Keypair could not be parsed.
    ParseKeypairError,
    /// Signature could not be parsed.
    ParseSignatureError,
    /// Signature does not verify.
    WrongSignature,
    /// Relay signer failed.
    SignerError,
    /// Solana RPC returned an error, usually a failed simulation.
    ClientError,
    /// On-chain program error.
    ProgramError,
    /// Amount is below the relay minimum.
    TooSmallAmount,
    /// Not enough SOL.
    NotEnoughBalance,
    /// Not enough tokens.
    NotEnoughTokenBalance,
    /// Mint decimals do not match.
    DecimalsMismatch,
    /// Token account does not exist.
    TokenAccountNotFound,
    /// Token account belongs to someone else.
    IncorrectAccountOwner,
    /// Token account holds another mint.
    TokenMintMismatch,
    /// Recipient address cannot receive the transfer.
    UnsupportedRecipientAddress,
    /// No fee calculator for the blockhash.
    FeeCalculatorNotFound,
    /// Swap output is below the required amount.
    NotEnoughOutAmount,
    /// Swap program is not whitelisted.
    UnknownSwapProgramId,
    /// Any kind this client does not know.
    #[serde(rename = "UnknownError")]
    Unknown,
}

impl ErrorType {
    /// Maps a wire name to a kind, falling back to [`ErrorType::Unknown`].
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        serde_json::from_value(serde_json::Value::String(name.trim().to_owned()))
            .unwrap_or(Self::Unknown)
    }
}

/// Payload attached to an [`ErrorType`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorData {
    /// Log lines or free-form messages.
    Array(Vec<String>),
    /// Named numeric values, such as `{"needed": 2039280}`.
    Dict(BTreeMap<String, u64>),
}

impl ErrorData {
    /// Returns the list payload, if any.
    #[must_use]
    pub fn as_array(&self) -> Option<&[String]> {
        match self {
            Self::Array(items) => Some(items),
            Self::Dict(_) => None,
        }
    }
}

/// Decoded `data` field of a relay error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDetail {
    /// Error kind.
    pub kind: ErrorType,
    /// Payload, when present and understood.
    pub data: Option<ErrorData>,
}

impl<'de> Deserialize<'de> for ErrorDetail {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
        let Some((name, value)) = map.into_iter().next() else {
            return Ok(Self {
                kind: ErrorType::Unknown,
                data: None,
            });
        };
        let data = serde_json::from_value::<ErrorData>(value).ok();
        Ok(Self {
            kind: ErrorType::from_name(&name),
            data,
        })
    }
}

/// Failure reported by the relay, or detected locally with a negative code.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, thiserror::Error)]
#[error("Relay error {code}: {message}")]
pub struct FeeRelayerError {
    /// Numeric error code.
    pub code: i64,
    /// Human-readable message.
    pub message: String,
    /// Structured detail.
    #[serde(default, deserialize_with = "lenient_detail")]
    pub data: Option<ErrorDetail>,
}

fn lenient_detail<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<ErrorDetail>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| ErrorDetail::deserialize(value).ok()))
}

/// Recognised cause of a [`ErrorType::ClientError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientErrorKind {
    /// Account cannot pay.
    InsufficientFunds,
    /// Transaction hit the instruction limit.
    MaximumNumberOfInstructionsAllowedExceeded,
    /// RPC connection dropped.
    ConnectionClosedBeforeMessageCompleted,
    /// Pool math rounded the output to zero.
    GivenPoolTokenAmountResultsInZeroTradingTokens,
    /// Swap output fell below the slippage bound.
    SwapInstructionExceedsDesiredSlippageLimit,
}

impl ClientErrorKind {
    /// Readable description.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::InsufficientFunds => "Insufficient funds",
            Self::MaximumNumberOfInstructionsAllowedExceeded => {
                "Exceeded maximum number of instructions allowed"
            }
            Self::ConnectionClosedBeforeMessageCompleted => {
                "Connection closed before message completed"
            }
            Self::GivenPoolTokenAmountResultsInZeroTradingTokens => {
                "Given pool token amount results in zero trading tokens"
            }
            Self::SwapInstructionExceedsDesiredSlippageLimit => {
                "Swap instruction exceeds desired slippage limit"
            }
        }
    }

    fn classify(log: &str) -> Option<Self> {
        if log.contains("exceeded maximum number of instructions allowed") {
            Some(Self::MaximumNumberOfInstructionsAllowedExceeded)
        } else if log.contains("insufficient funds") || log.contains("insufficient lamports") {
            Some(Self::InsufficientFunds)
        } else if log.contains("Given pool token amount results in zero trading tokens") {
            Some(Self::GivenPoolTokenAmountResultsInZeroTradingTokens)
        } else if log.contains("Swap instruction exceeds desired slippage limit") {
            Some(Self::SwapInstructionExceedsDesiredSlippageLimit)
        } else {
            None
        }
    }
}

/// Program logs extracted from a relay [`ErrorType::ClientError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientError {
    /// All program log lines found in the payload.
    pub program_logs: Vec<String>,
    /// Recognised cause.
    pub kind: Option<ClientErrorKind>,
    /// The failing log line with its prefix removed.
    pub error_log: Option<String>,
}

impl FeeRelayerError {
    /// Unclassified failure.
    pub const UNKNOWN: i64 = -1;
    /// Address could not be used.
    pub const WRONG_ADDRESS: i64 = -2;
    /// No pools route the requested pair.
    pub const SWAP_POOLS_NOT_FOUND: i64 = -3;
    /// Route needs an intermediate mint that was not supplied.
    pub const TRANSIT_TOKEN_MINT_NOT_FOUND: i64 = -4;
    /// Amount is zero or out of range.
    pub const INVALID_AMOUNT: i64 = -5;
    /// Signature missing or invalid.
    pub const INVALID_SIGNATURE: i64 = -6;
    /// Swap kind is not supported.
    pub const UNSUPPORTED_SWAP: i64 = -7;
    /// Relay context was not loaded.
    pub const RELAY_INFO_MISSING: i64 = -8;
    /// Fee payer does not match the relay.
    pub const INVALID_FEE_PAYER: i64 = -9;
    /// No token was chosen to pay the fee.
    pub const FEE_PAYING_TOKEN_MISSING: i64 = -10;
    /// Caller is not authorized.
    pub const UNAUTHORIZED: i64 = -11;
    /// Top up landed but the relayed transaction failed.
    pub const TOP_UP_SUCCESS_BUT_TRANSACTION_THROWS: i64 = -12;
    /// Cached relay context disagrees with the relay.
    pub const INCONSISTENT_RELAY_CONTEXT: i64 = -14;
    /// Transaction has no recent blockhash.
    pub const MISSING_BLOCKHASH: i64 = -15;
    /// Relay fee payer is not known.
    pub const MISSING_RELAY_FEE_PAYER: i64 = -16;

    /// Creates an error without detail.
    #[must_use]
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Unclassified failure, used when a relay response cannot be decoded.
    #[must_use]
    pub fn unknown() -> Self {
        Self::new(Self::UNKNOWN, "Unknown error")
    }

    /// Top up succeeded but the relayed transaction failed with `logs`.
    #[must_use]
    pub fn top_up_success_but_transaction_throws(logs: Vec<String>) -> Self {
        Self {
            code: Self::TOP_UP_SUCCESS_BUT_TRANSACTION_THROWS,
            message: "Topping up is successful, but the transaction failed".to_owned(),
            data: Some(ErrorDetail {
                kind: ErrorType::ClientError,
                data: Some(ErrorData::Array(logs)),
            }),
        }
    }

    /// Error kind from the detail, if any.
    #[must_use]
    pub fn kind(&self) -> Option<ErrorType> {
        self.data.as_ref().map(|detail| detail.kind)
    }

    /// Extracts program logs and a readable cause from a client error.
    ///
    /// Returns `None` unless the detail is an [`ErrorType::ClientError`] with
    /// either a dropped connection or a log payload.
    #[must_use]
    pub fn client_error(&self) -> Option<ClientError> {
        let detail = self.data.as_ref()?;
        if detail.kind != ErrorType::ClientError {
            return None;
        }
        if self.message.contains(CONNECTION_CLOSED) {
            return Some(ClientError {
                program_logs: Vec::new(),
                kind: Some(ClientErrorKind::ConnectionClosedBeforeMessageCompleted),
                error_log: Some(CONNECTION_CLOSED.to_owned()),
            });
        }
        let payload = detail.data.as_ref()?.as_array()?.first()?;
        let program_logs: Vec<String> = PROGRAM_LOG
            .find_iter(payload)
            .map(|m| m.as_str().replace('"', ""))
            .collect();
        let error_log = program_logs
            .iter()
            .find(|log| ERROR_LOG_PREFIXES.iter().any(|p| log.starts_with(p)))
            .cloned();
        let kind = error_log.as_deref().and_then(ClientErrorKind::classify);
        let error_log = error_log.map(|log| {
            log.replace("Program failed to complete: ", "")
                .replace("Program log: Error: ", "")
                .replace("Transfer: ", "")
        });
        Some(ClientError {
            program_logs,
            kind,
            error_log,
        })
    }
}
