//! Error types used throughout the application
//!
//! Provides the sync error taxonomy with retry classification. Only
//! network and rate-limit failures are retryable; everything else is
//! terminal until an operator intervenes (fix credentials, fix mapping,
//! fix currency).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Categories of sync errors for retry logic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Authentication errors (401-equivalent, refresh denied) - fatal
    /// until re-authorized
    Auth,
    /// Rate limiting errors (429-equivalent) - retryable with backoff
    RateLimit,
    /// Network/connection errors (timeout, DNS, reset) - retryable
    Network,
    /// Remote-side business-rule rejection (currency mismatch, missing
    /// mapping) - non-retryable
    Validation,
    /// Missing remote resource, likely misconfiguration - non-retryable
    NotFound,
    /// Configuration errors - non-retryable
    Config,
    /// Local persistence errors - non-retryable
    Storage,
    /// Bugs and invariant violations - non-retryable
    Internal,
}

impl ErrorCategory {
    /// Whether errors of this category are eligible for automatic retry.
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Network | Self::RateLimit)
    }
}

/// Main error type for LedgerSync
#[derive(Error, Debug)]
pub enum LedgerSyncError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerSyncError {
    /// Get the error category for this error
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Auth(_) => ErrorCategory::Auth,
            Self::RateLimit(_) => ErrorCategory::RateLimit,
            Self::Network(_) => ErrorCategory::Network,
            Self::Validation(_) => ErrorCategory::Validation,
            Self::NotFound(_) => ErrorCategory::NotFound,
            Self::Config(_) => ErrorCategory::Config,
            Self::Storage(_) => ErrorCategory::Storage,
            Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Check if this error should be retried automatically
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }
}

impl From<serde_json::Error> for LedgerSyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("serialization failed: {err}"))
    }
}

/// Result type alias for LedgerSync operations
pub type Result<T> = std::result::Result<T, LedgerSyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_match_variants() {
        assert_eq!(LedgerSyncError::Auth("x".into()).category(), ErrorCategory::Auth);
        assert_eq!(LedgerSyncError::RateLimit("x".into()).category(), ErrorCategory::RateLimit);
        assert_eq!(LedgerSyncError::Network("x".into()).category(), ErrorCategory::Network);
        assert_eq!(LedgerSyncError::Validation("x".into()).category(), ErrorCategory::Validation);
        assert_eq!(LedgerSyncError::NotFound("x".into()).category(), ErrorCategory::NotFound);
    }

    #[test]
    fn only_network_and_rate_limit_are_retryable() {
        assert!(LedgerSyncError::Network("timeout".into()).is_retryable());
        assert!(LedgerSyncError::RateLimit("slow down".into()).is_retryable());

        assert!(!LedgerSyncError::Auth("denied".into()).is_retryable());
        assert!(!LedgerSyncError::Validation("currency".into()).is_retryable());
        assert!(!LedgerSyncError::NotFound("gone".into()).is_retryable());
        assert!(!LedgerSyncError::Config("bad".into()).is_retryable());
        assert!(!LedgerSyncError::Storage("io".into()).is_retryable());
        assert!(!LedgerSyncError::Internal("bug".into()).is_retryable());
    }
}
