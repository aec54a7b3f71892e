//! Credential and token types.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Long-lived OAuth credential for one accounting account.
///
/// Created on the first successful grant-code exchange, mutated only by
/// re-authorization, never deleted automatically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    /// Regional datacenter label the credential was issued for.
    pub datacenter: String,
}

impl Credential {
    /// True iff all three credential fields are present and non-empty.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.client_id.is_empty()
            && !self.client_secret.is_empty()
            && !self.refresh_token.is_empty()
    }
}

/// Short-lived access token with its absolute expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Build a token from the provider's relative `expires_in`.
    #[must_use]
    pub fn new(token: String, expires_in_seconds: i64) -> Self {
        Self { token, expires_at: Utc::now() + Duration::seconds(expires_in_seconds) }
    }

    /// Whether the token is expired or will expire within `margin_seconds`.
    #[must_use]
    pub fn is_expired(&self, margin_seconds: i64) -> bool {
        Utc::now() >= self.expires_at - Duration::seconds(margin_seconds)
    }
}

/// Successful response from the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Present on grant-code exchanges; refreshes usually omit it.
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in: i64,
}
