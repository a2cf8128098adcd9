//! A [`FeeRelayerApi`] implementation that talks to a remote relay over HTTP.
//!
//! ## Error Handling
//!
//! Non-success responses are decoded as relay error objects
//! (`{"code", "message", "data"}`). Bodies that do not decode are reported as
//! [`FeeRelayerClientError::HttpStatus`] with the raw body.

use async_trait::async_trait;
use fee_relayer::api::{
    FeeLimitForAuthorityResponse, FeeRelayerApi, FeeTokenData, RelayRequest, RelayResponse,
    SignedRelayTransaction,
};
use fee_relayer::config::FeeRelayerConfig;
use fee_relayer::{FeeRelayerError, UsageStatus};
use http::HeaderMap;
use reqwest::{Client, RequestBuilder};
use std::fmt::Display;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use url::Url;

#[cfg(feature = "telemetry")]
use tracing::{Span, instrument};

use crate::constants::{FEE_PAYER_PATH, FEE_TOKEN_DATA_PATH, FREE_FEE_LIMITS_PATH};
use crate::error::FeeRelayerClientError;

#[derive(Clone, Debug)]
struct FeePayerCacheState {
    pubkey: String,
    expires_at: Instant,
}

/// TTL cache for the relay fee payer address.
///
/// Each clone has an independent cache state.
#[derive(Debug)]
pub struct FeePayerCache {
    ttl: Duration,
    state: RwLock<Option<FeePayerCacheState>>,
}

impl FeePayerCache {
    /// Creates a new cache with the given TTL.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            state: RwLock::new(None),
        }
    }

    /// Returns the cached address if still valid.
    pub async fn get(&self) -> Option<String> {
        let guard = self.state.read().await;
        let cache = guard.as_ref()?;
        (Instant::now() < cache.expires_at).then(|| cache.pubkey.clone())
    }

    /// Stores an address for the configured TTL.
    pub async fn set(&self, pubkey: String) {
        *self.state.write().await = Some(FeePayerCacheState {
            pubkey,
            expires_at: Instant::now() + self.ttl,
        });
    }

    /// Clears the cache.
    pub async fn clear(&self) {
        *self.state.write().await = None;
    }
}

impl Clone for FeePayerCache {
    fn clone(&self) -> Self {
        Self::new(self.ttl)
    }
}

/// Client for a remote fee relay.
#[derive(Clone, Debug)]
pub struct FeeRelayerClient {
    /// Versioned base URL, with a trailing slash.
    base_url: Url,
    fee_payer_url: Url,
    relay_transaction_url: Url,
    sign_relay_transaction_url: Url,
    client: Client,
    headers: HeaderMap,
    timeout: Option<Duration>,
    fee_payer_cache: FeePayerCache,
}

impl FeeRelayerClient {
    /// Default TTL of the cached fee payer address.
    pub const DEFAULT_FEE_PAYER_CACHE_TTL: Duration = Duration::from_secs(600);

    /// Returns the base URL used by this client.
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the configured timeout, if any.
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Returns the fee payer cache.
    pub const fn fee_payer_cache(&self) -> &FeePayerCache {
        &self.fee_payer_cache
    }

    /// Constructs a client for the relay at `base_url`, which must end with a slash.
    ///
    /// # Errors
    ///
    /// Returns [`FeeRelayerClientError::UrlParse`] if an endpoint URL cannot be built.
    pub fn try_new(base_url: Url) -> Result<Self, FeeRelayerClientError> {
        let join = |path: &str, context: &'static str| {
            base_url
                .join(path)
                .map_err(|source| FeeRelayerClientError::UrlParse { context, source })
        };
        let fee_payer_url = join(FEE_PAYER_PATH, "Failed to construct fee payer URL")?;
        let relay_transaction_url = join(
            RelayRequest::RELAY_TRANSACTION_PATH,
            "Failed to construct relay transaction URL",
        )?;
        let sign_relay_transaction_url = join(
            RelayRequest::SIGN_RELAY_TRANSACTION_PATH,
            "Failed to construct sign relay transaction URL",
        )?;
        Ok(Self {
            base_url,
            fee_payer_url,
            relay_transaction_url,
            sign_relay_transaction_url,
            client: Client::new(),
            headers: HeaderMap::new(),
            timeout: None,
            fee_payer_cache: FeePayerCache::new(Self::DEFAULT_FEE_PAYER_CACHE_TTL),
        })
    }

    /// Constructs a client from configuration, applying the API version
    /// prefix and the timeout.
    ///
    /// # Errors
    ///
    /// Returns [`FeeRelayerClientError::UrlParse`] if the configured URL is invalid.
    pub fn from_config(config: &FeeRelayerConfig) -> Result<Self, FeeRelayerClientError> {
        let url = Url::parse(&config.endpoint()).map_err(|source| FeeRelayerClientError::UrlParse {
            context: "Failed to parse base url",
            source,
        })?;
        let client = Self::try_new(url)?;
        Ok(match config.timeout() {
            Some(timeout) => client.with_timeout(timeout),
            None => client,
        })
    }

    /// Attaches custom headers to all future requests.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets a timeout for all future requests.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the TTL of the cached fee payer address.
    #[must_use]
    pub fn with_fee_payer_cache_ttl(mut self, ttl: Duration) -> Self {
        self.fee_payer_cache = FeePayerCache::new(ttl);
        self
    }

    /// Disables caching of the fee payer address.
    #[must_use]
    pub fn without_fee_payer_cache(self) -> Self {
        self.with_fee_payer_cache_ttl(Duration::ZERO)
    }

    fn endpoint(&self, prefix: &str, segment: &str) -> Result<Url, FeeRelayerClientError> {
        self.base_url
            .join(&format!("{prefix}{segment}"))
            .map_err(|source| FeeRelayerClientError::UrlParse {
                context: "Failed to construct endpoint URL",
                source,
            })
    }

    /// Fetches the relay fee payer address, from cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns [`FeeRelayerClientError`] if the request fails.
    pub async fn get_fee_payer_pubkey(&self) -> Result<String, FeeRelayerClientError> {
        if let Some(pubkey) = self.fee_payer_cache.get().await {
            return Ok(pubkey);
        }

        #[cfg(feature = "telemetry")]
        tracing::info!("fee_relayer.client.fee_payer_cache_miss");

        let pubkey = self.fee_payer_inner().await?;
        self.fee_payer_cache.set(pubkey.clone()).await;
        Ok(pubkey)
    }

    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "fee_relayer.client.fee_payer", skip_all, err)
    )]
    async fn fee_payer_inner(&self) -> Result<String, FeeRelayerClientError> {
        let body = self
            .send(self.client.get(self.fee_payer_url.clone()), "GET fee_payer/pubkey")
            .await?;
        let pubkey = serde_json::from_str::<String>(&body).unwrap_or_else(|_| body.trim().to_owned());
        Ok(pubkey)
    }

    /// Fetches the free-tier counters of `authority`.
    ///
    /// # Errors
    ///
    /// Returns [`FeeRelayerClientError`] if the request fails or the body does not decode.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "fee_relayer.client.free_fee_limits", skip(self), err)
    )]
    pub async fn get_free_fee_limits(&self, authority: &str) -> Result<UsageStatus, FeeRelayerClientError> {
        let url = self.endpoint(FREE_FEE_LIMITS_PATH, authority)?;
        let response: FeeLimitForAuthorityResponse = self
            .get_json(url, "GET free_fee_limits")
            .await?;
        Ok(response.into())
    }

    /// Fetches fee token metadata for `mint`.
    ///
    /// # Errors
    ///
    /// Returns [`FeeRelayerClientError`] if the request fails or the body does not decode.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "fee_relayer.client.fee_token_data", skip(self), err)
    )]
    pub async fn fee_token_data(&self, mint: &str) -> Result<FeeTokenData, FeeRelayerClientError> {
        let url = self.endpoint(FEE_TOKEN_DATA_PATH, mint)?;
        self.get_json(url, "GET fee_token_data").await
    }

    /// Submits a signed transaction.
    ///
    /// # Errors
    ///
    /// Returns [`FeeRelayerClientError`] if the request fails or the body does not decode.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "fee_relayer.client.send_transaction", skip_all, fields(path = request.path()), err)
    )]
    pub async fn send_transaction(&self, request: &RelayRequest) -> Result<RelayResponse, FeeRelayerClientError> {
        match request {
            RelayRequest::RelayTransaction(envelope) => {
                let body = self
                    .send(
                        self.client.post(self.relay_transaction_url.clone()).json(envelope),
                        "POST relay_transaction",
                    )
                    .await?;
                Ok(RelayResponse::Signature(bare_signature(&body)))
            }
            RelayRequest::SignRelayTransaction(envelope) => {
                let context = "POST sign_relay_transaction";
                let body = self
                    .send(
                        self.client.post(self.sign_relay_transaction_url.clone()).json(envelope),
                        context,
                    )
                    .await?;
                let signed: SignedRelayTransaction = serde_json::from_str(&body)
                    .map_err(|source| FeeRelayerClientError::JsonDeserialization { context, source })?;
                Ok(RelayResponse::Signed(signed))
            }
        }
    }

    async fn get_json<R>(&self, url: Url, context: &'static str) -> Result<R, FeeRelayerClientError>
    where
        R: serde::de::DeserializeOwned,
    {
        let body = self.send(self.client.get(url), context).await?;
        serde_json::from_str(&body)
            .map_err(|source| FeeRelayerClientError::JsonDeserialization { context, source })
    }

    /// Sends the request and returns the success body.
    ///
    /// `context` is a human-readable identifier used in tracing and error messages.
    async fn send(
        &self,
        mut req: RequestBuilder,
        context: &'static str,
    ) -> Result<String, FeeRelayerClientError> {
        for (key, value) in &self.headers {
            req = req.header(key, value);
        }
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }
        let http_response = req
            .send()
            .await
            .map_err(|source| FeeRelayerClientError::Http { context, source })?;

        let status = http_response.status();
        let body = http_response
            .text()
            .await
            .map_err(|source| FeeRelayerClientError::ResponseBodyRead { context, source })?;

        let result = if status.is_success() {
            Ok(body)
        } else {
            match serde_json::from_str::<FeeRelayerError>(&body) {
                Ok(source) => Err(FeeRelayerClientError::Relay { context, source }),
                Err(_) => Err(FeeRelayerClientError::HttpStatus {
                    context,
                    status,
                    body,
                }),
            }
        };

        record_result_on_span(&result);

        result
    }
}

/// Relay submissions answer with a signature as a JSON string, a one
/// element array or bare text.
fn bare_signature(body: &str) -> String {
    body.chars()
        .filter(|c| !matches!(c, '[' | ']' | '"'))
        .collect::<String>()
        .trim()
        .to_owned()
}

#[async_trait]
impl FeeRelayerApi for FeeRelayerClient {
    type Error = FeeRelayerClientError;

    async fn get_fee_payer_pubkey(&self) -> Result<String, Self::Error> {
        Self::get_fee_payer_pubkey(self).await
    }

    async fn fee_token_data(&self, mint: &str) -> Result<FeeTokenData, Self::Error> {
        Self::fee_token_data(self, mint).await
    }

    async fn get_free_fee_limits(&self, authority: &str) -> Result<UsageStatus, Self::Error> {
        Self::get_free_fee_limits(self, authority).await
    }

    async fn send_transaction(&self, request: &RelayRequest) -> Result<RelayResponse, Self::Error> {
        Self::send_transaction(self, request).await
    }
}

/// Converts a string URL into a `FeeRelayerClient`, normalizing the trailing slash.
impl TryFrom<&str> for FeeRelayerClient {
    type Error = FeeRelayerClientError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let mut normalized = value.trim_end_matches('/').to_owned();
        normalized.push('/');
        let url = Url::parse(&normalized).map_err(|source| FeeRelayerClientError::UrlParse {
            context: "Failed to parse base url",
            source,
        })?;
        Self::try_new(url)
    }
}

/// Records the outcome of a request on the current span.
#[cfg(feature = "telemetry")]
fn record_result_on_span<R, E: Display>(result: &Result<R, E>) {
    let span = Span::current();
    match result {
        Ok(_) => {
            span.record("otel.status_code", "OK");
        }
        Err(err) => {
            span.record("otel.status_code", "ERROR");
            span.record("error.message", tracing::field::display(err));
            tracing::event!(tracing::Level::ERROR, error = %err, "Request to relay failed");
        }
    }
}

/// Noop if telemetry feature is off.
#[cfg(not(feature = "telemetry"))]
fn record_result_on_span<R, E: Display>(_result: &Result<R, E>) {}

#[cfg(test)]
mod tests {
    use super::*;
    use fee_relayer::envelope::RelayEnvelope;
    use fee_relayer::stats::{DeviceType, Environment, OperationType, StatsInfo};
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FEE_PAYER: &str = "FG4Y3yX4AAchp1HvNZ7LfzFTewF2f6nDoMDCohTFrdpT";
    const OWNER: &str = "3h1zGmCwsRJnVk5BuRNMLsPaQu1y2aqXqXDWYCgrp5UG";
    const USDT: &str = "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB";

    fn client(server: &MockServer) -> FeeRelayerClient {
        FeeRelayerClient::try_from(server.uri().as_str()).unwrap()
    }

    fn envelope() -> RelayEnvelope {
        RelayEnvelope::encode(
            &[1, 2, 3],
            StatsInfo::new(OperationType::Swap, DeviceType::Web, Environment::Release),
        )
    }

    #[tokio::test]
    async fn test_fee_payer_is_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fee_payer/pubkey"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FEE_PAYER))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        assert_eq!(client.get_fee_payer_pubkey().await.unwrap(), FEE_PAYER);
        assert_eq!(client.get_fee_payer_pubkey().await.unwrap(), FEE_PAYER);
    }

    #[tokio::test]
    async fn test_fee_payer_json_string_without_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fee_payer/pubkey"))
            .respond_with(ResponseTemplate::new(200).set_body_json(FEE_PAYER))
            .expect(2)
            .mount(&server)
            .await;

        let client = client(&server).without_fee_payer_cache();
        assert_eq!(client.get_fee_payer_pubkey().await.unwrap(), FEE_PAYER);
        assert_eq!(client.get_fee_payer_pubkey().await.unwrap(), FEE_PAYER);
    }

    #[tokio::test]
    async fn test_free_fee_limits_map_to_usage_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/free_fee_limits/{OWNER}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "authority": [1, 2, 3],
                "limits": {
                    "use_free_fee": true,
                    "max_fee_amount": 10_000_000,
                    "max_fee_count": 100,
                    "max_token_account_creation_amount": 10_000_000,
                    "max_token_account_creation_count": 30,
                    "period": {"secs": 86_400, "nanos": 0}
                },
                "processed_fee": {"total_fee_amount": 15_000, "fee_count": 3, "rent_count": 0}
            })))
            .mount(&server)
            .await;

        let usage = client(&server).get_free_fee_limits(OWNER).await.unwrap();
        assert_eq!(usage, UsageStatus::new(100, 3, 10_000_000, 15_000));
        #[allow(deprecated)]
        let legacy = FeeRelayerApi::request_free_fee_limits(&client(&server), OWNER)
            .await
            .unwrap();
        assert_eq!(legacy, usage);
    }

    #[tokio::test]
    async fn test_fee_token_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/fee_token_data/{USDT}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "Tether USD",
                "code": "USDT",
                "mint": USDT,
                "account": FEE_PAYER,
                "exchange_rate": 0.000_1
            })))
            .mount(&server)
            .await;

        let data = client(&server).fee_token_data(USDT).await.unwrap();
        assert_eq!(data.code, "USDT");
        assert_eq!(data.mint, USDT);
    }

    #[tokio::test]
    async fn test_relay_transaction_returns_signature() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/relay_transaction"))
            .and(body_json(envelope()))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"["5wHu1qwD7q5"]"#))
            .mount(&server)
            .await;

        let response = client(&server)
            .send_transaction(&RelayRequest::RelayTransaction(envelope()))
            .await
            .unwrap();
        assert_eq!(response, RelayResponse::Signature("5wHu1qwD7q5".to_owned()));
    }

    #[tokio::test]
    async fn test_sign_relay_transaction_returns_partial_signature() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sign_relay_transaction"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "signature": "5wHu1qwD7q5",
                "transaction": "AQID"
            })))
            .mount(&server)
            .await;

        let response = client(&server)
            .send_transaction(&RelayRequest::SignRelayTransaction(envelope()))
            .await
            .unwrap();
        assert_eq!(response.signature(), "5wHu1qwD7q5");
        let RelayResponse::Signed(signed) = response else {
            panic!("expected signed transaction");
        };
        assert_eq!(signed.transaction, "AQID");
    }

    #[tokio::test]
    async fn test_relay_error_is_decoded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/relay_transaction"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "code": 6,
                "message": "Not enough balance",
                "data": {"NotEnoughBalance": {"needed": 2_039_280, "available": 19_266}}
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .send_transaction(&RelayRequest::RelayTransaction(envelope()))
            .await
            .unwrap_err();
        let relay_error = err.relay_error().unwrap();
        assert_eq!(relay_error.code, 6);
        assert_eq!(relay_error.kind(), Some(fee_relayer::error::ErrorType::NotEnoughBalance));
    }

    #[tokio::test]
    async fn test_undecodable_failure_keeps_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fee_payer/pubkey"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let err = client(&server).get_fee_payer_pubkey().await.unwrap_err();
        assert!(matches!(
            err,
            FeeRelayerClientError::HttpStatus { status, ref body, .. }
                if status == http::StatusCode::BAD_GATEWAY && body == "Bad Gateway"
        ));
    }

    #[tokio::test]
    async fn test_versioned_config() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/fee_payer/pubkey"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FEE_PAYER))
            .mount(&server)
            .await;

        let config = FeeRelayerConfig {
            base_url: server.uri(),
            api_version: 2,
            timeout_secs: Some(5),
            ..FeeRelayerConfig::default()
        };
        let client = FeeRelayerClient::from_config(&config).unwrap();
        assert_eq!(client.timeout(), Some(Duration::from_secs(5)));
        assert_eq!(client.get_fee_payer_pubkey().await.unwrap(), FEE_PAYER);
    }

    #[test]
    fn test_bare_signature() {
        assert_eq!(bare_signature("\"abc\""), "abc");
        assert_eq!(bare_signature("[\"abc\"]\n"), "abc");
        assert_eq!(bare_signature("abc"), "abc");
    }
}
