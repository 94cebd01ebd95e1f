//! Test assertion helpers.
//!
//! Provides polling-based assertions for async test scenarios.

use std::time::Duration;

use tokio::time::{Instant, sleep};

/// Default polling interval for [`assert_eventually`].
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Polls a condition until it returns true or the timeout expires.
///
/// Useful when a background task (a delayed writer, a scheduled shutdown)
/// changes state at a non-deterministic moment.
///
/// # Returns
///
/// `true` if the condition became true before timeout, `false` otherwise.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
///
/// use keyver_store::InMemoryStore;
/// use keyver_test_utils::assert_eventually;
///
/// # async fn example() {
/// let store = InMemoryStore::new();
/// let writer = store.clone();
/// tokio::spawn(async move {
///     tokio::time::sleep(Duration::from_millis(50)).await;
///     writer.set("crypto/used/BUY_VALUE", "1");
/// });
///
/// let result = assert_eventually(Duration::from_millis(200), || !store.is_empty()).await;
/// assert!(result, "pointer should be written");
/// # }
/// ```
pub async fn assert_eventually<F>(timeout: Duration, condition: F) -> bool
where
    F: Fn() -> bool,
{
    let start = Instant::now();

    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        sleep(DEFAULT_POLL_INTERVAL).await;
    }

    // Final check after timeout
    condition()
}
