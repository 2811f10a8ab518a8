//! HTTP transport, retry logic and rate-limit tracking.
//!
//! [`ServiceClient`] performs authenticated JSON requests against the API, retrying
//! transient failures with exponential backoff and honouring the rate-limit headers the
//! API returns. Every resource client in the workspace wraps one.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use reqwest::header::{HeaderMap, ACCEPT};
use reqwest::{Method, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::error::{map_status_to_error, Error, Result};

/// Default API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.hetzner.cloud/v1";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default interval between two polls of a running action, in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

// Connection pool settings

/// Default idle timeout for connection pools
pub const DEFAULT_POOL_IDLE_TIMEOUT: u64 = 90;

/// Default maximum idle connections per host
pub const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 10;

// Retry settings

/// Default maximum number of retry attempts
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Default initial retry delay in milliseconds
pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;

/// Default maximum retry delay in milliseconds (for exponential backoff)
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 5000;

/// Remaining request budget below which a warning is logged.
const RATE_LIMIT_LOW_WATERMARK: u32 = 10;

const USER_AGENT: &str = concat!("hcloud-rust/", env!("CARGO_PKG_VERSION"));

/// Retry policy with exponential backoff.
///
/// Configures how HTTP requests should be retried on failure, using exponential
/// backoff to avoid overwhelming failing services.
///
/// Unavailable services and rate-limit rejections are retried for every method. A
/// timeout is retried only for idempotent methods (`GET`, `HEAD`, `PUT`, `DELETE`,
/// `OPTIONS`); a timed-out `POST` may already have been applied and is returned to
/// the caller. On `429 Too Many Requests` the wait is the later of the policy backoff
/// and the `RateLimit-Reset` time, capped at `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts
    pub max_retries: u32,

    /// Initial delay before first retry
    pub initial_delay: Duration,

    /// Maximum delay between retries (cap for exponential backoff)
    pub max_delay: Duration,

    /// Backoff multiplier (typically 2 for exponential backoff)
    pub backoff_multiplier: u32,
}

impl RetryPolicy {
    /// Create a new retry policy with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_RETRY_MAX_DELAY_MS),
            backoff_multiplier: 2,
        }
    }

    /// Create a retry policy with no retries.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::from_millis(0),
            max_delay: Duration::from_millis(0),
            backoff_multiplier: 1,
        }
    }

    /// Set the maximum number of retries.
    #[must_use]
    pub const fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the initial delay.
    #[must_use]
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the maximum delay.
    #[must_use]
    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the backoff multiplier.
    #[must_use]
    pub const fn with_backoff_multiplier(mut self, multiplier: u32) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Calculate delay for a given attempt number.
    ///
    /// Uses exponential backoff: delay = min(initial_delay * multiplier^(attempt-1), max_delay)
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::from_secs(0);
        }

        let multiplier = self.backoff_multiplier.saturating_pow(attempt - 1);
        let delay = self.initial_delay.saturating_mul(multiplier);

        std::cmp::min(delay, self.max_delay)
    }

    /// Check if retries are enabled.
    #[must_use]
    pub const fn has_retries(&self) -> bool {
        self.max_retries > 0
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// HTTP client configuration.
///
/// Configures HTTP client behavior including timeouts, retries, connection pooling and
/// the action polling interval.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout
    pub timeout: Duration,

    /// Retry policy
    pub retry_policy: RetryPolicy,

    /// Interval between two polls of a running action
    pub poll_interval: Duration,

    /// Connection pool idle timeout
    pub pool_idle_timeout: Duration,

    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,

    /// Enable request/response logging
    pub enable_logging: bool,

    /// Enable response compression
    pub enable_compression: bool,
}

impl ClientConfig {
    /// Create a new client configuration with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry_policy: RetryPolicy::new(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            pool_idle_timeout: Duration::from_secs(DEFAULT_POOL_IDLE_TIMEOUT),
            pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
            enable_logging: true,
            enable_compression: true,
        }
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set retry policy.
    #[must_use]
    pub const fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Disable retries.
    #[must_use]
    pub const fn without_retries(mut self) -> Self {
        self.retry_policy = RetryPolicy::no_retry();
        self
    }

    /// Set the action polling interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set connection pool idle timeout.
    #[must_use]
    pub const fn with_pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }

    /// Set maximum idle connections per host.
    #[must_use]
    pub const fn with_pool_max_idle(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Enable or disable logging.
    #[must_use]
    pub const fn with_logging(mut self, enabled: bool) -> Self {
        self.enable_logging = enabled;
        self
    }

    /// Enable or disable compression.
    #[must_use]
    pub const fn with_compression(mut self, enabled: bool) -> Self {
        self.enable_compression = enabled;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Rate-limit state reported by the last response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    /// Requests allowed per window.
    pub limit: u32,
    /// Requests left in the current window.
    pub remaining: u32,
    /// Unix timestamp at which the budget is fully restored.
    pub reset: i64,
}

impl RateLimit {
    fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let value = |name: &str| headers.get(name)?.to_str().ok()?.trim().parse::<i64>().ok();

        Some(Self {
            limit: u32::try_from(value("RateLimit-Limit")?).ok()?,
            remaining: u32::try_from(value("RateLimit-Remaining")?).ok()?,
            reset: value("RateLimit-Reset")?,
        })
    }

    /// Time left until the budget resets, measured from now.
    #[must_use]
    pub fn until_reset(&self) -> Duration {
        let secs = self.reset.saturating_sub(Utc::now().timestamp());
        Duration::from_secs(u64::try_from(secs).unwrap_or(0))
    }
}

/// Builder for [`ServiceClient`].
#[derive(Debug, Clone)]
pub struct ServiceClientBuilder {
    base_url: Url,
    user_agent: String,
    token: Option<SecretString>,
    config: ClientConfig,
}

impl ServiceClientBuilder {
    /// Create a builder for the specified base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        let mut raw = base_url.as_ref().trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base_url = Url::parse(&raw)?;

        Ok(Self {
            base_url,
            user_agent: USER_AGENT.to_string(),
            token: None,
            config: ClientConfig::default(),
        })
    }

    /// Append an application identifier to the user agent.
    #[must_use]
    pub fn with_application(mut self, name: &str, version: Option<&str>) -> Self {
        self.user_agent = match version {
            Some(version) => format!("{USER_AGENT} {name}/{version}"),
            None => format!("{USER_AGENT} {name}"),
        };
        self
    }

    /// Configure the bearer token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(SecretString::from(token.into()));
        self
    }

    /// Configure the bearer token from an existing secret.
    #[must_use]
    pub fn with_secret_token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    /// Override the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.config.retry_policy = retry;
        self
    }

    /// Override the action polling interval.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Override the HTTP client configuration.
    #[must_use]
    pub fn with_http_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn build(self) -> Result<ServiceClient> {
        let http = reqwest::Client::builder()
            .timeout(self.config.timeout)
            .pool_idle_timeout(self.config.pool_idle_timeout)
            .pool_max_idle_per_host(self.config.pool_max_idle_per_host)
            .gzip(self.config.enable_compression)
            .user_agent(self.user_agent)
            .build()
            .map_err(|err| Error::ConfigError(format!("Failed to build HTTP client: {err}")))?;

        Ok(ServiceClient {
            inner: Arc::new(Inner {
                http,
                base_url: self.base_url,
                token: self.token,
                config: self.config,
                rate_limit: Mutex::new(None),
            }),
        })
    }
}

struct Inner {
    http: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
    config: ClientConfig,
    rate_limit: Mutex<Option<RateLimit>>,
}

/// Authenticated JSON transport shared by all resource clients.
///
/// Cloning is cheap; clones share the connection pool and rate-limit state.
#[derive(Clone)]
pub struct ServiceClient {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ServiceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl ServiceClient {
    /// Construct a client for the base URL with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        ServiceClientBuilder::new(base_url)?.build()
    }

    /// Return the base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Return the client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Interval between two polls of a running action.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.inner.config.poll_interval
    }

    /// Rate-limit state reported by the most recent response, if any.
    #[must_use]
    pub fn rate_limit(&self) -> Option<RateLimit> {
        self.inner.rate_limit.lock().ok().and_then(|guard| *guard)
    }

    /// Perform a GET request and decode the JSON body.
    ///
    /// # Errors
    ///
    /// Returns the mapped API error or a parse error.
    pub async fn get_json<T>(&self, path: &str, params: &[(&'static str, String)]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.send_json::<(), T>(Method::GET, path, None, params)
            .await
    }

    /// Perform a GET request, mapping a missing resource to `None`.
    ///
    /// # Errors
    ///
    /// Returns any error other than [`Error::NotFound`].
    pub async fn get_optional<T>(&self, path: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        match self.get_json(path, &[]).await {
            Ok(value) => Ok(Some(value)),
            Err(Error::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Send a request with an optional JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns the mapped API error or a parse error.
    pub async fn send_json<B, R>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        params: &[(&'static str, String)],
    ) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self.execute_with_retry(method, path, body, params).await?;

        response.json::<R>().await.map_err(|err| {
            Error::ParseError(format!("Failed to parse API response for `{path}`: {err}"))
        })
    }

    /// Send a request whose response carries no body of interest.
    ///
    /// # Errors
    ///
    /// Returns the mapped API error.
    pub async fn send_empty<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        self.execute_with_retry(method, path, body, &[]).await?;
        Ok(())
    }

    /// Send a request, retrying transient failures according to the retry policy.
    ///
    /// # Errors
    ///
    /// Returns the last error once retries are exhausted, or the first non-retryable error.
    pub async fn execute_with_retry<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        params: &[(&'static str, String)],
    ) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        let url = self.inner.base_url.join(path.trim_start_matches('/'))?;
        let policy = self.inner.config.retry_policy;
        let mut attempt = 0;

        loop {
            let mut request = self
                .inner
                .http
                .request(method.clone(), url.clone())
                .header(ACCEPT, "application/json");
            if !params.is_empty() {
                request = request.query(params);
            }
            if let Some(token) = &self.inner.token {
                request = request.bearer_auth(token.expose_secret());
            }
            if let Some(payload) = body {
                request = request.json(payload);
            }

            let (err, server_delay) = match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    let rate_limit = self.record_rate_limit(response.headers());
                    if self.inner.config.enable_logging {
                        debug!(%method, path, status = status.as_u16(), attempt, "hcloud request");
                    }
                    if status.is_success() {
                        return Ok(response);
                    }
                    let text = response.text().await.unwrap_or_default();
                    let delay = rate_limit
                        .filter(|_| status == reqwest::StatusCode::TOO_MANY_REQUESTS)
                        .map(|limit| limit.until_reset());
                    (map_status_to_error(status, &text), delay)
                }
                Err(err) => (Error::from(err), None),
            };

            let replay_unsafe = matches!(err, Error::Timeout(_)) && !is_idempotent(&method);
            if !err.is_retryable() || replay_unsafe || attempt >= policy.max_retries {
                return Err(err);
            }

            attempt += 1;
            let backoff = policy.delay_for_attempt(attempt);
            let delay = server_delay.map_or(backoff, |d| d.max(backoff).min(policy.max_delay));
            let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
            warn!(%method, path, attempt, delay_ms, error = %err, "retrying hcloud request");
            tokio::time::sleep(delay).await;
        }
    }

    fn record_rate_limit(&self, headers: &HeaderMap) -> Option<RateLimit> {
        let rate_limit = RateLimit::from_headers(headers)?;
        if rate_limit.remaining < RATE_LIMIT_LOW_WATERMARK {
            warn!(
                remaining = rate_limit.remaining,
                limit = rate_limit.limit,
                "hcloud rate limit nearly exhausted"
            );
        }
        if let Ok(mut guard) = self.inner.rate_limit.lock() {
            *guard = Some(rate_limit);
        }
        Some(rate_limit)
    }
}

/// A timed-out request with one of these methods may be sent again without side effects.
fn is_idempotent(method: &Method) -> bool {
    [Method::GET, Method::HEAD, Method::PUT, Method::DELETE, Method::OPTIONS].contains(method)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_retry() -> RetryPolicy {
        RetryPolicy::new()
            .with_max_retries(2)
            .with_initial_delay(Duration::from_millis(1))
            .with_max_delay(Duration::from_millis(5))
    }

    fn test_client(server: &MockServer) -> ServiceClient {
        ServiceClientBuilder::new(server.uri())
            .unwrap()
            .with_token("secret-token")
            .with_retry_policy(fast_retry())
            .build()
            .unwrap()
    }

    #[test]
    fn test_retry_policy_new() {
        let policy = RetryPolicy::new();
        assert_eq!(policy.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(policy.initial_delay, Duration::from_millis(DEFAULT_RETRY_DELAY_MS));
        assert_eq!(policy.max_delay, Duration::from_millis(DEFAULT_RETRY_MAX_DELAY_MS));
        assert_eq!(policy.backoff_multiplier, 2);
    }

    #[test]
    fn test_retry_policy_no_retry() {
        let policy = RetryPolicy::no_retry();
        assert_eq!(policy.max_retries, 0);
        assert!(!policy.has_retries());
    }

    #[test]
    fn test_retry_policy_delay_calculation() {
        let policy = RetryPolicy::new();

        assert_eq!(policy.delay_for_attempt(0), Duration::from_secs(0));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(1000));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(2000));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_millis(4000));

        // capped at max_delay
        assert_eq!(policy.delay_for_attempt(5), Duration::from_millis(5000));
        assert_eq!(policy.delay_for_attempt(30), Duration::from_millis(5000));
    }

    #[test]
    fn test_client_config_builder() {
        let config = ClientConfig::new()
            .with_timeout(Duration::from_secs(60))
            .with_retry_policy(RetryPolicy::no_retry())
            .with_poll_interval(Duration::from_secs(2))
            .with_pool_idle_timeout(Duration::from_secs(120))
            .with_pool_max_idle(20)
            .with_logging(false)
            .with_compression(false);

        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.retry_policy.max_retries, 0);
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.pool_idle_timeout, Duration::from_secs(120));
        assert_eq!(config.pool_max_idle_per_host, 20);
        assert!(!config.enable_logging);
        assert!(!config.enable_compression);
    }

    #[test]
    fn test_client_config_default_poll_interval() {
        let config = ClientConfig::default();
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_builder_normalizes_base_url() {
        let builder = ServiceClientBuilder::new("https://api.hetzner.cloud/v1").unwrap();
        let client = builder.build().unwrap();
        assert_eq!(client.base_url().as_str(), "https://api.hetzner.cloud/v1/");
        assert_eq!(
            client.base_url().join("servers/1").unwrap().as_str(),
            "https://api.hetzner.cloud/v1/servers/1"
        );
    }

    #[test]
    fn test_builder_rejects_invalid_url() {
        assert!(matches!(
            ServiceClientBuilder::new("not a url"),
            Err(Error::InvalidEndpoint(_))
        ));
    }

    #[tokio::test]
    async fn sends_bearer_token_and_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/servers"))
            .and(header("Authorization", "Bearer secret-token"))
            .and(query_param("name", "web-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"servers": []})))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let body: serde_json::Value = client
            .get_json("servers", &[("name", "web-1".to_string())])
            .await
            .unwrap();
        assert_eq!(body, json!({"servers": []}));
    }

    #[tokio::test]
    async fn retries_transient_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/locations/1"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/locations/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let body: serde_json::Value = client.get_json("locations/1", &[]).await.unwrap();
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/locations/1"))
            .respond_with(ResponseTemplate::new(502))
            .expect(3)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client
            .get_json::<serde_json::Value>("locations/1", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn does_not_retry_client_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ssh_keys"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "error": {"code": "invalid_input", "message": "invalid public key"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client
            .send_json::<_, serde_json::Value>(
                Method::POST,
                "ssh_keys",
                Some(&json!({"name": "k"})),
                &[],
            )
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "invalid_input");
    }

    #[tokio::test]
    async fn get_optional_maps_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/servers/9"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"code": "not_found", "message": "server with ID '9' not found"}
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let server_value: Option<serde_json::Value> =
            client.get_optional("servers/9").await.unwrap();
        assert!(server_value.is_none());
    }

    #[tokio::test]
    async fn records_rate_limit_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/isos"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("RateLimit-Limit", "3600")
                    .insert_header("RateLimit-Remaining", "3599")
                    .insert_header("RateLimit-Reset", "1731938400")
                    .set_body_json(json!({"isos": []})),
            )
            .mount(&server)
            .await;

        let client = test_client(&server);
        assert!(client.rate_limit().is_none());
        let _: serde_json::Value = client.get_json("isos", &[]).await.unwrap();
        assert_eq!(
            client.rate_limit(),
            Some(RateLimit {
                limit: 3600,
                remaining: 3599,
                reset: 1_731_938_400,
            })
        );
    }

    fn timeout_client(server: &MockServer) -> ServiceClient {
        ServiceClientBuilder::new(server.uri())
            .unwrap()
            .with_http_config(
                ClientConfig::new()
                    .with_timeout(Duration::from_millis(50))
                    .with_retry_policy(fast_retry()),
            )
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn rate_limited_retries_wait_for_backoff_when_reset_has_passed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/servers"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("RateLimit-Limit", "3600")
                    .insert_header("RateLimit-Remaining", "0")
                    .insert_header("RateLimit-Reset", "0")
                    .set_body_json(json!({
                        "error": {"code": "rate_limit_exceeded", "message": "limit reached"}
                    })),
            )
            .up_to_n_times(3)
            .expect(3)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/servers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"servers": []})))
            .expect(1)
            .mount(&server)
            .await;

        let client = ServiceClientBuilder::new(server.uri())
            .unwrap()
            .with_retry_policy(
                RetryPolicy::new()
                    .with_max_retries(3)
                    .with_initial_delay(Duration::from_millis(20))
                    .with_max_delay(Duration::from_millis(500)),
            )
            .build()
            .unwrap();

        let started = std::time::Instant::now();
        let body: serde_json::Value = client.get_json("servers", &[]).await.unwrap();
        assert_eq!(body, json!({"servers": []}));
        // 20 + 40 + 80 ms of backoff
        assert!(started.elapsed() >= Duration::from_millis(140));
    }

    #[tokio::test]
    async fn timed_out_post_is_not_replayed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/servers"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_delay(Duration::from_millis(300))
                    .set_body_json(json!({"server": {"id": 1}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = timeout_client(&server);
        let err = client
            .send_json::<_, serde_json::Value>(
                Method::POST,
                "servers",
                Some(&json!({"name": "web-1"})),
                &[],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
    }

    #[tokio::test]
    async fn timed_out_get_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/servers/1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_millis(300))
                    .set_body_json(json!({"server": {"id": 1}})),
            )
            .expect(3)
            .mount(&server)
            .await;

        let client = timeout_client(&server);
        let err = client
            .get_json::<serde_json::Value>("servers/1", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
    }

    #[test]
    fn idempotent_methods() {
        assert!(is_idempotent(&Method::GET));
        assert!(is_idempotent(&Method::PUT));
        assert!(is_idempotent(&Method::DELETE));
        assert!(!is_idempotent(&Method::POST));
    }
}
