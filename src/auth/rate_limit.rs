//! Attempt counting shared by the login and MFA flows.
//!
//! Counters live in the coordination store; the window opens on the first
//! failure and never extends. Clearing on success is best-effort so a store
//! hiccup cannot fail an otherwise successful authentication.

use anyhow::Result;
use std::time::Duration;
use tracing::warn;

use crate::store::CoordinationStore;

#[derive(Clone, Copy, Debug)]
pub struct AttemptLimiter {
    max_attempts: u64,
    window: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureOutcome {
    /// The failure just recorded reached the threshold.
    Blocked,
    /// Attempts left before the threshold.
    Remaining(u64),
}

impl AttemptLimiter {
    #[must_use]
    pub fn new(max_attempts: u64, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
        }
    }

    /// Whether the key already reached the threshold. Read-only; never
    /// consumes an attempt.
    pub async fn is_blocked(&self, store: &dyn CoordinationStore, key: &str) -> Result<bool> {
        let count = store
            .get(key)
            .await?
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(0);

        Ok(count >= self.max_attempts)
    }

    /// Record a failed attempt and report the resulting position.
    pub async fn record_failure(
        &self,
        store: &dyn CoordinationStore,
        key: &str,
    ) -> Result<FailureOutcome> {
        let count = store.increment_with_expiry(key, self.window).await?;

        if count >= self.max_attempts {
            Ok(FailureOutcome::Blocked)
        } else {
            Ok(FailureOutcome::Remaining(self.max_attempts - count))
        }
    }

    /// Reset the counter. Best-effort: a store failure is logged, never
    /// propagated.
    pub async fn clear(&self, store: &dyn CoordinationStore, key: &str) {
        if let Err(err) = store.delete(key).await {
            warn!("failed to clear attempt counter {key}: {err:#}");
        }
    }
}
