//! Retry logic with exponential backoff.
//!
//! Every store request the registry issues goes through
//! [`with_retry_cancellable`]. Transient store errors are retried with
//! jittered exponential backoff; rejections are returned at once. Both the
//! request and the backoff sleep race against cancellation.

use std::{future::Future, time::Duration};

use keyver_store::StoreError;
use rand::Rng;
use tokio_util::sync::CancellationToken;

use crate::{
    config::RetryPolicy,
    error::{OpContext, RegistryError, Result},
};

/// The cancellation sources an operation observes.
///
/// `root` is the registry's own token and fires on shutdown; `request` is
/// the optional token a caller passed to a `*_with_token` method.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CancelScope<'a> {
    root: &'a CancellationToken,
    request: Option<&'a CancellationToken>,
}

impl<'a> CancelScope<'a> {
    pub(crate) fn new(root: &'a CancellationToken, request: Option<&'a CancellationToken>) -> Self {
        Self { root, request }
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.root.is_cancelled() || self.request.is_some_and(CancellationToken::is_cancelled)
    }

    /// Completes when either token is cancelled.
    pub(crate) async fn cancelled(&self) {
        match self.request {
            Some(request) => {
                tokio::select! {
                    () = self.root.cancelled() => {},
                    () = request.cancelled() => {},
                }
            },
            None => self.root.cancelled().await,
        }
    }

    /// Maps a fired token to the error the caller sees.
    ///
    /// Shutdown wins over a request cancellation when both fired.
    pub(crate) fn error(&self, op: &OpContext) -> RegistryError {
        if self.root.is_cancelled() {
            RegistryError::Shutdown
        } else {
            RegistryError::Cancelled { op: op.clone() }
        }
    }
}

/// Execute a store request with retry and cancellation support.
///
/// Behaves like a backoff loop over [`StoreError::is_retryable`] errors, but
/// races each attempt and each backoff sleep against `scope`. If either
/// token fires, the in-flight attempt is dropped and `Cancelled` (or
/// `Shutdown`) is returned.
///
/// # Retry Strategy
///
/// - **Exponential backoff**: `initial_backoff * multiplier^(attempt-1)`
/// - **Jitter**: ±`jitter` randomness applied to prevent thundering herd
/// - **Cap**: Backoff capped at `max_backoff`
/// - **Termination**: After `max_attempts` failed attempts, reported as
///   [`RegistryError::StoreUnavailable`] with the full attempt history
///
/// A non-retryable store error is reported as [`RegistryError::Internal`]
/// without further attempts.
pub(crate) async fn with_retry_cancellable<F, Fut, T>(
    policy: &RetryPolicy,
    scope: &CancelScope<'_>,
    op: &OpContext,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, StoreError>>,
{
    // Fail fast if already cancelled
    if scope.is_cancelled() {
        return Err(scope.error(op));
    }

    let mut attempt: u32 = 0;
    let mut backoff_duration = policy.initial_backoff;
    let mut attempt_history: Vec<(u32, String)> = Vec::new();

    loop {
        attempt += 1;

        let result = tokio::select! {
            biased;
            () = scope.cancelled() => {
                return Err(scope.error(op));
            }
            result = operation() => result,
        };

        let err = match result {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        attempt_history.push((attempt, err.to_string()));

        if !err.is_retryable() {
            return Err(RegistryError::Internal { op: op.clone(), message: err.to_string() });
        }
        if attempt >= policy.max_attempts {
            return Err(RegistryError::StoreUnavailable {
                op: op.clone(),
                attempts: attempt,
                last_error: err.to_string(),
                attempt_history,
            });
        }

        let jittered = apply_jitter(backoff_duration, policy.jitter);

        tracing::debug!(
            operation = op.operation(),
            attempt = attempt,
            backoff_ms = jittered.as_millis() as u64,
            error = %err,
            "retrying store request after backoff"
        );

        tokio::select! {
            biased;
            () = scope.cancelled() => {
                return Err(scope.error(op));
            }
            () = tokio::time::sleep(jittered) => {}
        }

        backoff_duration = std::cmp::min(
            Duration::from_nanos((backoff_duration.as_nanos() as f64 * policy.multiplier) as u64),
            policy.max_backoff,
        );
    }
}

/// Apply jitter to a duration.
///
/// Jitter adds randomness in the range `[dur * (1 - factor), dur * (1 + factor)]`
/// to prevent thundering herd when multiple clients retry simultaneously.
fn apply_jitter(dur: Duration, factor: f64) -> Duration {
    if factor <= 0.0 {
        return dur;
    }

    let factor = factor.clamp(0.0, 1.0);
    let mut rng = rand::rng();

    let base_nanos = dur.as_nanos() as f64;
    let min_nanos = base_nanos * (1.0 - factor);
    let max_nanos = base_nanos * (1.0 + factor);

    let jittered_nanos = rng.random_range(min_nanos..=max_nanos);
    Duration::from_nanos(jittered_nanos as u64)
}


#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        /// Property: Jittered duration stays within base * (1 ± factor)
        #[test]
        fn prop_jitter_within_bounds(
            base_ms in 1u64..10000,
            factor in 0.0f64..=1.0
        ) {
            let dur = Duration::from_millis(base_ms);
            let jittered = apply_jitter(dur, factor);

            let max_allowed = Duration::from_nanos(
                (dur.as_nanos() as f64 * (1.0 + factor)).ceil() as u64
            );
            let min_allowed = Duration::from_nanos(
                (dur.as_nanos() as f64 * (1.0 - factor)).floor() as u64
            );

            prop_assert!(jittered <= max_allowed, "jittered {:?} exceeds max {:?}", jittered, max_allowed);
            prop_assert!(jittered >= min_allowed, "jittered {:?} below min {:?}", jittered, min_allowed);
        }

        /// Property: Negative jitter factor treated as zero (no jitter)
        #[test]
        fn prop_negative_jitter_is_identity(
            base_ms in 1u64..10000,
            factor in -10.0f64..0.0
        ) {
            let dur = Duration::from_millis(base_ms);
            prop_assert_eq!(apply_jitter(dur, factor), dur);
        }

        /// Property: Factor > 1.0 is clamped, so jitter never exceeds 2x the base
        #[test]
        fn prop_large_factor_clamped(
            base_ms in 1u64..10000,
            factor in 1.0f64..100.0
        ) {
            let dur = Duration::from_millis(base_ms);
            let jittered = apply_jitter(dur, factor);
            prop_assert!(jittered <= dur * 2);
        }
    }
}
