//! Side-channel statistics attached to relayed transactions.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

/// Kind of operation a relayed transaction performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationType {
    /// Top up of the user's relay account.
    TopUp,
    /// Token or SOL transfer.
    Transfer,
    /// Token swap.
    Swap,
    /// Anything else.
    Other,
    /// Transfer through a claimable payment link.
    SendViaLink,
}

/// Client platform that produced the transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceType {
    /// Browser client.
    Web,
    /// Android client.
    Android,
    /// iOS client.
    Ios,
}

/// Build flavour of the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Development build.
    Dev,
    /// Release build.
    #[default]
    Release,
}

/// Metadata the relay records for its own accounting.
///
/// Has no effect on transaction semantics.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsInfo {
    /// What the transaction does.
    pub operation_type: OperationType,
    /// Client platform.
    pub device_type: DeviceType,
    /// Fee token or currency symbol, when relevant.
    #[serde(default)]
    pub currency: Option<String>,
    /// Client build number.
    #[serde(default)]
    pub build: Option<String>,
    /// Client build flavour.
    pub environment: Environment,
}

impl StatsInfo {
    /// Creates statistics without currency or build information.
    #[must_use]
    pub const fn new(
        operation_type: OperationType,
        device_type: DeviceType,
        environment: Environment,
    ) -> Self {
        Self {
            operation_type,
            device_type,
            currency: None,
            build: None,
            environment,
        }
    }

    /// Sets the currency.
    #[must_use]
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    /// Sets the build number.
    #[must_use]
    pub fn with_build(mut self, build: impl Into<String>) -> Self {
        self.build = Some(build.into());
        self
    }
}
