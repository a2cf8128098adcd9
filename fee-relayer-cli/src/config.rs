//! Command line configuration.
//!
//! Loads configuration from a TOML file with support for environment variable
//! expansion in string values. Variables use `$VAR` or `${VAR}` syntax.
//!
//! # Example Configuration
//!
//! ```toml
//! [relayer]
//! base_url = "https://fee-relayer.key.app"
//! api_version = 2
//! timeout_secs = 30
//! environment = "release"
//!
//! [headers]
//! authorization = "Bearer $RELAYER_TOKEN"
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG`: path to the configuration file (default: `fee-relayer.toml`)
//! - `FEE_RELAYER_URL`: overrides `relayer.base_url`
//! - `FEE_RELAYER_API_VERSION`: overrides `relayer.api_version`

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use fee_relayer::config::FeeRelayerConfig;
use fee_relayer_http::FeeRelayerClient;
use http::{HeaderMap, HeaderName, HeaderValue};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::CliError;

/// Default configuration file name.
pub const DEFAULT_CONFIG_PATH: &str = "fee-relayer.toml";

static ENV_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)")
        .expect("Invalid env var pattern")
});

/// Top-level command line configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Relay client settings.
    #[serde(default)]
    pub relayer: FeeRelayerConfig,

    /// Extra headers sent with every request.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl CliConfig {
    /// Loads configuration from the path given by the `CONFIG` environment
    /// variable, falling back to [`DEFAULT_CONFIG_PATH`].
    ///
    /// # Errors
    ///
    /// Returns [`CliError`] if the file cannot be read or parsed.
    pub fn load() -> Result<Self, CliError> {
        let path = std::env::var("CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_owned());
        Self::load_from(&path)
    }

    /// Loads configuration from `path`. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`CliError`] if the file cannot be read or parsed.
    pub fn load_from(path: &str) -> Result<Self, CliError> {
        let content = if Path::new(path).exists() {
            std::fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
                path: path.to_owned(),
                source,
            })?
        } else {
            String::new()
        };
        let mut config = Self::parse(&content)?;

        if let Ok(url) = std::env::var("FEE_RELAYER_URL") {
            config.relayer.base_url = url;
        }
        if let Some(version) = std::env::var("FEE_RELAYER_API_VERSION")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.relayer.api_version = version;
        }
        Ok(config)
    }

    /// Parses a TOML document after expanding environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::ConfigParse`] if the document is invalid.
    pub fn parse(content: &str) -> Result<Self, CliError> {
        Ok(toml::from_str(&expand_env_vars(content))?)
    }

    /// Headers to attach to relay requests.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::InvalidHeader`] if a name or value is not a valid header.
    pub fn header_map(&self) -> Result<HeaderMap, CliError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let name = HeaderName::try_from(name.as_str())
                .map_err(|_| CliError::InvalidHeader(name.clone()))?;
            let value = HeaderValue::try_from(value.as_str())
                .map_err(|_| CliError::InvalidHeader(name.to_string()))?;
            headers.insert(name, value);
        }
        Ok(headers)
    }

    /// Builds a relay client from this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CliError`] if the URL or a header is invalid.
    pub fn client(&self) -> Result<FeeRelayerClient, CliError> {
        Ok(FeeRelayerClient::from_config(&self.relayer)?.with_headers(self.header_map()?))
    }
}

/// Expands `$VAR` and `${VAR}` from the process environment.
///
/// Unresolved variables are left as-is.
fn expand_env_vars(input: &str) -> String {
    ENV_VAR
        .replace_all(input, |caps: &Captures<'_>| {
            let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
            std::env::var(name).unwrap_or_else(|_| caps[0].to_owned())
        })
        .into_owned()
}
