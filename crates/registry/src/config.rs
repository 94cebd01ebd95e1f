//! Registry configuration with builder pattern.
//!
//! Provides type-safe configuration for [`VersionedKeyRegistry`] including:
//! - Store endpoints and connection timeout, handed to store connectors
//! - Per-request timeout applied to every store call
//! - Retry policy for transient store failures
//! - Bound on compare-and-swap conflict retries
//!
//! [`VersionedKeyRegistry`]: crate::VersionedKeyRegistry

use std::time::Duration;

use snafu::ensure;

use crate::error::{ConfigSnafu, Result};

/// Default per-request timeout (10 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default connection timeout (2 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Default number of re-read rounds after a lost compare-and-swap.
const DEFAULT_MAX_CONFLICT_RETRIES: u32 = 3;

/// Configuration for a [`VersionedKeyRegistry`](crate::VersionedKeyRegistry).
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Store endpoints as `host:port` (e.g. `localhost:2379`).
    pub(crate) endpoints: Vec<String>,

    /// Connection establishment timeout.
    pub(crate) connect_timeout: Duration,

    /// Timeout applied to each individual store request.
    pub(crate) timeout: Duration,

    /// Retry policy for transient store failures.
    pub(crate) retry_policy: RetryPolicy,

    /// Conditional-write losses tolerated before reporting a conflict.
    pub(crate) max_conflict_retries: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            endpoints: Vec::new(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            timeout: DEFAULT_TIMEOUT,
            retry_policy: RetryPolicy::default(),
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
        }
    }
}

impl RegistryConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> RegistryConfigBuilder {
        RegistryConfigBuilder::default()
    }

    /// Returns the configured store endpoints.
    #[must_use]
    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Returns the connection timeout.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the retry policy.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Returns how many lost compare-and-swap rounds are retried.
    #[must_use]
    pub fn max_conflict_retries(&self) -> u32 {
        self.max_conflict_retries
    }
}

/// Builder for [`RegistryConfig`].
#[derive(Debug, Default)]
pub struct RegistryConfigBuilder {
    endpoints: Vec<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    retry_policy: Option<RetryPolicy>,
    max_conflict_retries: Option<u32>,
}

impl RegistryConfigBuilder {
    /// Sets the store endpoints.
    ///
    /// Endpoints are `host:port` pairs, optionally prefixed with
    /// `http://` or `https://`.
    #[must_use]
    pub fn with_endpoints<I, S>(mut self, endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.endpoints = endpoints.into_iter().map(Into::into).collect();
        self
    }

    /// Adds a single store endpoint.
    #[must_use]
    pub fn with_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.endpoints.push(endpoint.into());
        self
    }

    /// Sets the per-request timeout.
    ///
    /// Default: 10 seconds.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connection establishment timeout.
    ///
    /// Default: 2 seconds.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the retry policy for transient store failures.
    ///
    /// Default: [`RetryPolicy::default()`].
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Sets how many lost compare-and-swap rounds are retried before an
    /// operation fails with a conflict.
    ///
    /// Default: 3.
    #[must_use]
    pub fn with_max_conflict_retries(mut self, retries: u32) -> Self {
        self.max_conflict_retries = Some(retries);
        self
    }

    /// Builds the configuration, validating all settings.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Any endpoint is not a `host:port` pair
    /// - Timeout is zero
    /// - Connect timeout is zero
    /// - The retry policy is invalid
    pub fn build(self) -> Result<RegistryConfig> {
        for endpoint in &self.endpoints {
            validate_endpoint(endpoint)?;
        }

        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        ensure!(!timeout.is_zero(), ConfigSnafu { message: "timeout cannot be zero" });

        let connect_timeout = self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT);
        ensure!(
            !connect_timeout.is_zero(),
            ConfigSnafu { message: "connect_timeout cannot be zero" }
        );

        let retry_policy = self.retry_policy.unwrap_or_default();
        retry_policy.validate()?;

        Ok(RegistryConfig {
            endpoints: self.endpoints,
            connect_timeout,
            timeout,
            retry_policy,
            max_conflict_retries: self
                .max_conflict_retries
                .unwrap_or(DEFAULT_MAX_CONFLICT_RETRIES),
        })
    }
}

/// Retry policy configuration.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts per store request (including the initial attempt).
    pub max_attempts: u32,

    /// Initial backoff duration before first retry.
    pub initial_backoff: Duration,

    /// Maximum backoff duration.
    pub max_backoff: Duration,

    /// Backoff multiplier for exponential increase.
    pub multiplier: f64,

    /// Jitter factor (0.0 to 1.0) for randomizing backoff.
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(10),
            multiplier: 2.0,
            jitter: 0.25,
        }
    }
}

impl RetryPolicy {
    /// Creates a new retry policy builder.
    #[must_use]
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::default()
    }

    /// Creates a policy that never retries.
    #[must_use]
    pub fn no_retry() -> Self {
        Self { max_attempts: 1, ..Default::default() }
    }

    /// Validates the policy values.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `max_attempts` is zero, `multiplier`
    /// is below 1.0, `jitter` is outside `0.0..=1.0`, or `initial_backoff`
    /// exceeds `max_backoff`.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.max_attempts > 0, ConfigSnafu { message: "max_attempts must be > 0" });
        ensure!(self.multiplier >= 1.0, ConfigSnafu { message: "multiplier must be >= 1.0" });
        ensure!(
            (0.0..=1.0).contains(&self.jitter),
            ConfigSnafu { message: "jitter must be between 0.0 and 1.0" }
        );
        ensure!(
            self.initial_backoff <= self.max_backoff,
            ConfigSnafu { message: "initial_backoff cannot exceed max_backoff" }
        );
        Ok(())
    }
}

/// Builder for [`RetryPolicy`].
#[derive(Debug, Default)]
pub struct RetryPolicyBuilder {
    max_attempts: Option<u32>,
    initial_backoff: Option<Duration>,
    max_backoff: Option<Duration>,
    multiplier: Option<f64>,
    jitter: Option<f64>,
}

impl RetryPolicyBuilder {
    /// Sets the maximum number of attempts.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Sets the initial backoff duration.
    #[must_use]
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = Some(backoff);
        self
    }

    /// Sets the maximum backoff duration.
    #[must_use]
    pub fn with_max_backoff(mut self, backoff: Duration) -> Self {
        self.max_backoff = Some(backoff);
        self
    }

    /// Sets the backoff multiplier.
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = Some(multiplier);
        self
    }

    /// Sets the jitter factor (0.0 to 1.0).
    #[must_use]
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = Some(jitter);
        self
    }

    /// Builds the retry policy.
    #[must_use]
    pub fn build(self) -> RetryPolicy {
        let defaults = RetryPolicy::default();
        RetryPolicy {
            max_attempts: self.max_attempts.unwrap_or(defaults.max_attempts),
            initial_backoff: self.initial_backoff.unwrap_or(defaults.initial_backoff),
            max_backoff: self.max_backoff.unwrap_or(defaults.max_backoff),
            multiplier: self.multiplier.unwrap_or(defaults.multiplier),
            jitter: self.jitter.unwrap_or(defaults.jitter),
        }
    }
}

/// Validates that an endpoint is a `host:port` pair.
fn validate_endpoint(endpoint: &str) -> Result<()> {
    let address = endpoint
        .strip_prefix("http://")
        .or_else(|| endpoint.strip_prefix("https://"))
        .unwrap_or(endpoint);

    ensure!(
        !address.contains(char::is_whitespace),
        ConfigSnafu { message: format!("endpoint '{endpoint}' cannot contain whitespace") }
    );

    let Some((host, port)) = address.rsplit_once(':') else {
        return ConfigSnafu { message: format!("endpoint '{endpoint}' must be host:port") }.fail();
    };
    ensure!(
        !host.is_empty(),
        ConfigSnafu { message: format!("endpoint '{endpoint}' must have a host") }
    );
    match port.parse::<u16>() {
        Ok(p) if p > 0 => Ok(()),
        _ => ConfigSnafu { message: format!("endpoint '{endpoint}' has an invalid port") }.fail(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::RegistryError;

    #[test]
    fn test_defaults() {
        let config = RegistryConfig::builder().build().unwrap();
        assert!(config.endpoints().is_empty());
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.connect_timeout(), Duration::from_secs(2));
        assert_eq!(config.max_conflict_retries(), 3);
        assert_eq!(config.retry_policy().max_attempts, 3);
    }

    #[test]
    fn test_default_matches_builder_defaults() {
        let built = RegistryConfig::builder().build().unwrap();
        let default = RegistryConfig::default();
        assert_eq!(built.timeout(), default.timeout());
        assert_eq!(built.connect_timeout(), default.connect_timeout());
        assert_eq!(built.max_conflict_retries(), default.max_conflict_retries());
    }

    #[test]
    fn test_endpoints_accepted() {
        let config = RegistryConfig::builder()
            .with_endpoints(["localhost:2379", "localhost:22379"])
            .with_endpoint("http://10.0.0.7:32379")
            .build()
            .unwrap();
        assert_eq!(config.endpoints().len(), 3);
        assert_eq!(config.endpoints()[0], "localhost:2379");
    }

    #[test]
    fn test_endpoint_validation() {
        for bad in ["localhost", ":2379", "localhost:", "localhost:0", "localhost:99999", "local host:1"]
        {
            let result = RegistryConfig::builder().with_endpoint(bad).build();
            assert!(
                matches!(result, Err(RegistryError::Config { .. })),
                "endpoint {bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_zero_timeouts_rejected() {
        let result = RegistryConfig::builder().with_timeout(Duration::ZERO).build();
        assert!(matches!(result, Err(RegistryError::Config { .. })));

        let result = RegistryConfig::builder().with_connect_timeout(Duration::ZERO).build();
        assert!(matches!(result, Err(RegistryError::Config { .. })));
    }

    #[test]
    fn test_custom_values() {
        let config = RegistryConfig::builder()
            .with_timeout(Duration::from_millis(250))
            .with_connect_timeout(Duration::from_millis(50))
            .with_max_conflict_retries(0)
            .with_retry_policy(RetryPolicy::no_retry())
            .build()
            .unwrap();
        assert_eq!(config.timeout(), Duration::from_millis(250));
        assert_eq!(config.connect_timeout(), Duration::from_millis(50));
        assert_eq!(config.max_conflict_retries(), 0);
        assert_eq!(config.retry_policy().max_attempts, 1);
    }

    #[test]
    fn test_retry_policy_builder() {
        let policy = RetryPolicy::builder()
            .with_max_attempts(5)
            .with_initial_backoff(Duration::from_millis(20))
            .with_max_backoff(Duration::from_secs(1))
            .with_multiplier(3.0)
            .with_jitter(0.0)
            .build();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.initial_backoff, Duration::from_millis(20));
        assert_eq!(policy.max_backoff, Duration::from_secs(1));
        assert!((policy.multiplier - 3.0).abs() < f64::EPSILON);
        assert!(policy.jitter.abs() < f64::EPSILON);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_retry_policy_validation() {
        let invalid = [
            RetryPolicy { max_attempts: 0, ..Default::default() },
            RetryPolicy { multiplier: 0.5, ..Default::default() },
            RetryPolicy { jitter: 1.5, ..Default::default() },
            RetryPolicy { jitter: -0.1, ..Default::default() },
            RetryPolicy {
                initial_backoff: Duration::from_secs(20),
                max_backoff: Duration::from_secs(10),
                ..Default::default()
            },
        ];
        for policy in invalid {
            assert!(policy.validate().is_err(), "{policy:?} should be invalid");
            let result = RegistryConfig::builder().with_retry_policy(policy).build();
            assert!(result.is_err());
        }
    }
}
