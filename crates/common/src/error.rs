//! Common error types shared by the utility modules.

use thiserror::Error;

/// Error type for the infrastructure-free utility modules.
#[derive(Debug, Error)]
pub enum CommonError {
    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for CommonError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias for common operations.
pub type CommonResult<T> = std::result::Result<T, CommonError>;
