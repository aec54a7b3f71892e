//! Retry policy and sync trigger actions.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Remote action executed when a configured order-status trigger fires.
///
/// A closed enum rather than action strings so invalid actions are
/// unrepresentable in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncAction {
    /// Create (or update) a draft invoice.
    CreateDraft,
    /// Create the invoice and finalize it immediately.
    CreateAndSubmit,
    /// Mirror local refunds as remote credit notes.
    CreateCreditNote,
}

/// How failed syncs are re-attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryMode {
    /// Retry until `max_count` attempts, then mark permanently failed.
    MaxRetries,
    /// Retry forever.
    Indefinite,
    /// Never retry automatically; the operator re-triggers by hand.
    Manual,
}

/// Global retry configuration read by the retry scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub mode: RetryMode,
    pub max_count: u32,
    pub backoff_minutes: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { mode: RetryMode::MaxRetries, max_count: 5, backoff_minutes: 15 }
    }
}

impl RetryPolicy {
    /// Delay before the next eligible retry: `backoff_minutes * 2^retry_count`.
    ///
    /// The exponent is clamped so the shift cannot overflow for pathological
    /// retry counts.
    #[must_use]
    pub fn delay_before(&self, retry_count: u32) -> Duration {
        let factor = 1u64 << retry_count.min(16);
        Duration::minutes((self.backoff_minutes.saturating_mul(factor)) as i64)
    }

    /// Whether an order at the given retry count may be retried again.
    #[must_use]
    pub fn allows_retry(&self, retry_count: u32) -> bool {
        match self.mode {
            RetryMode::Manual => false,
            RetryMode::Indefinite => true,
            RetryMode::MaxRetries => retry_count < self.max_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_per_attempt() {
        let policy =
            RetryPolicy { mode: RetryMode::MaxRetries, max_count: 10, backoff_minutes: 15 };
        assert_eq!(policy.delay_before(0), Duration::minutes(15));
        assert_eq!(policy.delay_before(1), Duration::minutes(30));
        assert_eq!(policy.delay_before(2), Duration::minutes(60));
        assert_eq!(policy.delay_before(3), Duration::minutes(120));
    }

    #[test]
    fn max_retries_bounds_attempts() {
        let policy = RetryPolicy { mode: RetryMode::MaxRetries, max_count: 3, backoff_minutes: 5 };
        assert!(policy.allows_retry(0));
        assert!(policy.allows_retry(2));
        assert!(!policy.allows_retry(3));
    }

    #[test]
    fn manual_mode_never_retries() {
        let policy = RetryPolicy { mode: RetryMode::Manual, max_count: 3, backoff_minutes: 5 };
        assert!(!policy.allows_retry(0));
    }

    #[test]
    fn indefinite_mode_always_retries() {
        let policy = RetryPolicy { mode: RetryMode::Indefinite, max_count: 0, backoff_minutes: 5 };
        assert!(policy.allows_retry(1000));
    }
}
