//! Test configuration helpers.
//!
//! Provides configurations tuned for fast, deterministic tests, centralizing
//! values that would otherwise be scattered across test modules.

use std::{sync::Arc, time::Duration};

use keyver_registry::{RegistryConfig, RetryPolicy, VersionedKeyRegistry};
use keyver_store::InMemoryStore;

/// Returns a retry policy suitable for tests.
///
/// - `max_attempts`: 3 (same as production)
/// - `initial_backoff`: 1ms, `max_backoff`: 10ms (fast retries)
/// - `jitter`: 0.0 (predictable timing)
#[must_use]
pub fn test_retry_policy() -> RetryPolicy {
    RetryPolicy::builder()
        .with_max_attempts(3)
        .with_initial_backoff(Duration::from_millis(1))
        .with_max_backoff(Duration::from_millis(10))
        .with_jitter(0.0)
        .build()
}

/// Returns a registry configuration suitable for tests.
///
/// Uses [`test_retry_policy`], a 1 second request timeout and the default
/// conflict budget.
#[must_use]
pub fn test_registry_config() -> RegistryConfig {
    RegistryConfig::builder()
        .with_retry_policy(test_retry_policy())
        .with_timeout(Duration::from_secs(1))
        .build()
        .unwrap_or_default()
}

/// Creates a registry over a fresh [`InMemoryStore`] using
/// [`test_registry_config`].
///
/// The returned store shares state with the registry, so tests can inject
/// faults or inspect raw keys.
#[must_use]
pub fn test_registry() -> (VersionedKeyRegistry, InMemoryStore) {
    test_registry_with(test_registry_config())
}

/// Creates a registry over a fresh [`InMemoryStore`] with a custom config.
#[must_use]
pub fn test_registry_with(config: RegistryConfig) -> (VersionedKeyRegistry, InMemoryStore) {
    let store = InMemoryStore::new();
    let registry = VersionedKeyRegistry::new(Arc::new(store.clone()), config);
    (registry, store)
}
