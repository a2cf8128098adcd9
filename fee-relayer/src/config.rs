//! Client configuration.
//!
//! Every field has a default so an empty document is a valid configuration.
//!
//! ```rust
//! use fee_relayer::config::FeeRelayerConfig;
//!
//! let config: FeeRelayerConfig = serde_json::from_str(r#"{"api_version": 2}"#).unwrap();
//! assert_eq!(config.api_version, 2);
//! assert_eq!(config.lamports_per_signature, 5000);
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::context::{RelayAccountStatus, RelayContext};
use crate::stats::{DeviceType, Environment, OperationType, StatsInfo};
use crate::usage::UsageStatus;

/// Relay client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRelayerConfig {
    /// Relay API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API version; versions above 1 prefix every path with `/v{n}`.
    #[serde(default = "default_api_version")]
    pub api_version: u32,

    /// Per-request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Network fee per signature.
    #[serde(default = "default_lamports_per_signature")]
    pub lamports_per_signature: u64,

    /// Rent-exempt minimum of a token account.
    #[serde(default = "default_minimum_token_account_balance")]
    pub minimum_token_account_balance: u64,

    /// Rent-exempt minimum of the relay account.
    #[serde(default = "default_minimum_relay_account_balance")]
    pub minimum_relay_account_balance: u64,

    /// Largest instruction count placed in one transaction before account
    /// creation is moved to a separate setup transaction.
    #[serde(default = "default_max_instructions_per_transaction")]
    pub max_instructions_per_transaction: usize,

    /// Client platform reported in statistics.
    #[serde(default = "default_device_type")]
    pub device_type: DeviceType,

    /// Client build reported in statistics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<String>,

    /// Client build flavour reported in statistics.
    #[serde(default)]
    pub environment: Environment,
}

fn default_base_url() -> String {
    "https://fee-relayer.key.app".to_owned()
}

const fn default_api_version() -> u32 {
    1
}

const fn default_lamports_per_signature() -> u64 {
    5000
}

const fn default_minimum_token_account_balance() -> u64 {
    2_039_280
}

const fn default_minimum_relay_account_balance() -> u64 {
    890_880
}

const fn default_max_instructions_per_transaction() -> usize {
    7
}

const fn default_device_type() -> DeviceType {
    DeviceType::Web
}

impl Default for FeeRelayerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_version: default_api_version(),
            timeout_secs: None,
            lamports_per_signature: default_lamports_per_signature(),
            minimum_token_account_balance: default_minimum_token_account_balance(),
            minimum_relay_account_balance: default_minimum_relay_account_balance(),
            max_instructions_per_transaction: default_max_instructions_per_transaction(),
            device_type: default_device_type(),
            build: None,
            environment: Environment::default(),
        }
    }
}

impl FeeRelayerConfig {
    /// Request timeout, if configured.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Base URL with the version prefix applied and a trailing slash.
    #[must_use]
    pub fn endpoint(&self) -> String {
        let mut endpoint = self.base_url.trim_end_matches('/').to_owned();
        if self.api_version > 1 {
            endpoint.push_str(&format!("/v{}", self.api_version));
        }
        endpoint.push('/');
        endpoint
    }

    /// Statistics for `operation_type` carrying this client's platform and build.
    #[must_use]
    pub fn stats_info(&self, operation_type: OperationType) -> StatsInfo {
        let info = StatsInfo::new(operation_type, self.device_type, self.environment);
        match &self.build {
            Some(build) => info.with_build(build.clone()),
            None => info,
        }
    }

    /// Relay context built from the configured chain constants and the
    /// relay state fetched for the user.
    #[must_use]
    pub fn relay_context(
        &self,
        fee_payer_address: String,
        relay_account_status: RelayAccountStatus,
        usage_status: UsageStatus,
    ) -> RelayContext {
        RelayContext {
            minimum_token_account_balance: self.minimum_token_account_balance,
            minimum_relay_account_balance: self.minimum_relay_account_balance,
            fee_payer_address,
            lamports_per_signature: self.lamports_per_signature,
            relay_account_status,
            usage_status,
        }
    }
}
