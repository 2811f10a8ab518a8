//! Configuration structures for hcloud clients.
//!
//! This module provides the client configuration, its validation, and the lookup of
//! settings from environment variables or files named by `<VAR>_FILE` variables.

use crate::client::{
    ClientConfig, RetryPolicy, ServiceClientBuilder, DEFAULT_ENDPOINT, DEFAULT_MAX_RETRIES,
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_TIMEOUT_SECS,
};
use crate::Error;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Environment variable holding the API token.
pub const ENV_TOKEN: &str = "HCLOUD_TOKEN";
/// Environment variable overriding the API endpoint.
pub const ENV_ENDPOINT: &str = "HCLOUD_ENDPOINT";
/// Environment variable overriding the action poll interval (milliseconds).
pub const ENV_POLL_INTERVAL: &str = "HCLOUD_POLL_INTERVAL";

/// Length of a valid API token.
const TOKEN_LENGTH: usize = 64;

/// Read a setting from the environment.
///
/// Returns the value of `name` when it is set, even if empty. Otherwise, when
/// `<name>_FILE` is set, the named file is read and returned with trailing whitespace
/// removed. When neither is set the empty string is returned.
///
/// # Errors
///
/// Returns [`Error::ConfigError`] if the value is not valid UTF-8 or the file named by
/// `<name>_FILE` cannot be read.
pub fn lookup_env(name: &str) -> Result<String, Error> {
    if let Some(value) = std::env::var_os(name) {
        return value
            .into_string()
            .map_err(|_| Error::ConfigError(format!("{name} is not valid UTF-8")));
    }

    let file_var = format!("{name}_FILE");
    let Some(path) = std::env::var_os(&file_var) else {
        return Ok(String::new());
    };

    let contents = std::fs::read_to_string(&path).map_err(|err| {
        Error::ConfigError(format!(
            "Failed to read {file_var} ({}): {err}",
            Path::new(&path).display()
        ))
    })?;

    Ok(contents.trim_end().to_string())
}

/// Configuration for an hcloud client instance.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct HcloudConfig {
    /// API base URL
    #[validate(url)]
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// API token; never serialized
    #[serde(skip)]
    pub token: Option<SecretString>,

    /// Interval between action polls in milliseconds
    #[validate(range(min = 1, max = 60000))]
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Maximum number of retry attempts
    #[validate(range(min = 0, max = 10))]
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Application name appended to the user agent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_name: Option<String>,

    /// Application version appended to the user agent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_version: Option<String>,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

const fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

const fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

impl HcloudConfig {
    /// Create a configuration for the default endpoint with the given token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self::default().with_token(token)
    }

    /// Build a configuration from `HCLOUD_TOKEN`, `HCLOUD_ENDPOINT` and
    /// `HCLOUD_POLL_INTERVAL`, each of which may also be supplied through its
    /// `_FILE` variant.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be read or the result fails validation.
    pub fn from_env() -> Result<Self, Error> {
        let mut config = Self::default();

        let token = lookup_env(ENV_TOKEN)?;
        if !token.is_empty() {
            config.token = Some(SecretString::from(token));
        }

        let endpoint = lookup_env(ENV_ENDPOINT)?;
        if !endpoint.is_empty() {
            config.endpoint = endpoint;
        }

        let poll_interval = lookup_env(ENV_POLL_INTERVAL)?;
        if !poll_interval.is_empty() {
            config.poll_interval_ms = poll_interval.parse().map_err(|_| {
                Error::ConfigError(format!(
                    "{ENV_POLL_INTERVAL} must be a number of milliseconds, got `{poll_interval}`"
                ))
            })?;
        }

        config.validate().map_err(|e| {
            Error::ConfigError(format!("Invalid configuration: {e}"))
        })?;

        Ok(config)
    }

    /// Set the API token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(SecretString::from(token.into()));
        self
    }

    /// Set the API endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the action poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// Set maximum retry attempts.
    #[must_use]
    pub const fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Identify the calling application in the user agent.
    #[must_use]
    pub fn with_application(mut self, name: impl Into<String>, version: Option<String>) -> Self {
        self.application_name = Some(name.into());
        self.application_version = version;
        self
    }

    /// Get the poll interval as a Duration.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Parse and validate the endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn parse_endpoint(&self) -> Result<Url, Error> {
        Url::parse(&self.endpoint)
            .map_err(|e| Error::ConfigError(format!("Invalid endpoint URL: {e}")))
    }

    /// Check that the configured token has the shape of an API token.
    ///
    /// # Errors
    ///
    /// Returns an error if no token is set or it is not 64 alphanumeric characters.
    pub fn validate_token(&self) -> Result<(), Error> {
        let token = self
            .token
            .as_ref()
            .ok_or_else(|| Error::ConfigError(format!("{ENV_TOKEN} is not set")))?;
        let token = token.expose_secret();

        if token.len() != TOKEN_LENGTH || !token.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::ConfigError(format!(
                "API token must be {TOKEN_LENGTH} alphanumeric characters"
            )));
        }
        Ok(())
    }

    /// Create a transport builder reflecting this configuration.
    ///
    /// A client without a token is allowed; a token that is present must be well formed.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails, the token is malformed or the endpoint is
    /// invalid.
    pub fn client_builder(&self) -> Result<ServiceClientBuilder, Error> {
        self.validate().map_err(|e| {
            Error::ConfigError(format!("Invalid configuration: {e}"))
        })?;
        if self.token.is_some() {
            self.validate_token()?;
        }

        let http_config = ClientConfig::new()
            .with_timeout(self.timeout())
            .with_poll_interval(self.poll_interval())
            .with_retry_policy(RetryPolicy::new().with_max_retries(self.max_retries));

        let mut builder = ServiceClientBuilder::new(&self.endpoint)?.with_http_config(http_config);
        if let Some(token) = &self.token {
            builder = builder.with_secret_token(token.clone());
        }
        if let Some(name) = &self.application_name {
            builder = builder.with_application(name, self.application_version.as_deref());
        }
        Ok(builder)
    }
}

impl Default for HcloudConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            token: None,
            poll_interval_ms: default_poll_interval_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
            application_name: None,
            application_version: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_lookup_env_prefers_variable_even_if_empty() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "from-file").unwrap();

        std::env::set_var("HCLOUD_TEST_LOOKUP_EMPTY", "");
        std::env::set_var("HCLOUD_TEST_LOOKUP_EMPTY_FILE", file.path());

        assert_eq!(lookup_env("HCLOUD_TEST_LOOKUP_EMPTY").unwrap(), "");
    }

    #[test]
    fn test_lookup_env_reads_file_and_trims() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "content  \n").unwrap();

        std::env::remove_var("HCLOUD_TEST_LOOKUP_FILE");
        std::env::set_var("HCLOUD_TEST_LOOKUP_FILE_FILE", file.path());

        assert_eq!(lookup_env("HCLOUD_TEST_LOOKUP_FILE").unwrap(), "content");
    }

    #[test]
    fn test_lookup_env_unset_returns_empty() {
        std::env::remove_var("HCLOUD_TEST_LOOKUP_UNSET");
        std::env::remove_var("HCLOUD_TEST_LOOKUP_UNSET_FILE");

        assert_eq!(lookup_env("HCLOUD_TEST_LOOKUP_UNSET").unwrap(), "");
    }

    #[test]
    fn test_lookup_env_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing-token");

        std::env::remove_var("HCLOUD_TEST_LOOKUP_MISSING");
        std::env::set_var("HCLOUD_TEST_LOOKUP_MISSING_FILE", &missing);

        let err = lookup_env("HCLOUD_TEST_LOOKUP_MISSING").unwrap_err();
        assert!(matches!(err, Error::ConfigError(msg) if msg.contains("HCLOUD_TEST_LOOKUP_MISSING_FILE")));
    }

    #[test]
    fn test_config_defaults() {
        let config = HcloudConfig::default();
        assert_eq!(config.endpoint, "https://api.hetzner.cloud/v1");
        assert!(config.token.is_none());
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.max_retries, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = HcloudConfig::new("token")
            .with_endpoint("http://localhost:8080/v1")
            .with_poll_interval(Duration::from_secs(1))
            .with_timeout(60)
            .with_max_retries(2)
            .with_application("my-tool", Some("1.2.3".to_string()));

        assert_eq!(config.token.as_ref().map(|t| t.expose_secret().to_string()), Some("token".to_string()));
        assert_eq!(config.poll_interval_ms, 1000);
        assert_eq!(config.request_timeout_secs, 60);
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.application_name.as_deref(), Some("my-tool"));
        assert_eq!(config.parse_endpoint().unwrap().port(), Some(8080));
    }

    #[test]
    fn test_config_validation_ranges() {
        let mut config = HcloudConfig::default();
        config.poll_interval_ms = 0;
        assert!(config.validate().is_err());

        config.poll_interval_ms = 500;
        config.request_timeout_secs = 301;
        assert!(config.validate().is_err());

        config.request_timeout_secs = 30;
        config.max_retries = 11;
        assert!(config.validate().is_err());

        config.max_retries = 3;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_invalid_endpoint() {
        let config = HcloudConfig::default().with_endpoint("not-a-url");
        assert!(config.validate().is_err());
        assert!(matches!(config.client_builder(), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_validate_token() {
        let valid = "a".repeat(64);
        assert!(HcloudConfig::new(valid).validate_token().is_ok());
        assert!(HcloudConfig::new("short").validate_token().is_err());
        assert!(HcloudConfig::new(format!("{}!", "a".repeat(63)))
            .validate_token()
            .is_err());
        assert!(HcloudConfig::default().validate_token().is_err());
    }

    #[test]
    fn test_config_never_serializes_token() {
        let config = HcloudConfig::new("super-secret");
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("super-secret"));

        let parsed: HcloudConfig = serde_json::from_str(&json).unwrap();
        assert!(parsed.token.is_none());
        assert_eq!(parsed.endpoint, config.endpoint);
    }

    #[test]
    fn test_config_deserialize_applies_defaults() {
        let config: HcloudConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
    }

    #[test]
    fn test_client_builder_uses_poll_interval() {
        let client = HcloudConfig::new("a".repeat(64))
            .with_poll_interval(Duration::from_millis(250))
            .client_builder()
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(client.poll_interval(), Duration::from_millis(250));
        assert_eq!(client.config().retry_policy.max_retries, DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn test_client_builder_rejects_malformed_token() {
        let err = HcloudConfig::new("not-a-token").client_builder().unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));

        assert!(HcloudConfig::default().client_builder().is_ok());
    }
}
