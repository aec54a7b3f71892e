//! Trait seams for the auth module.

use async_trait::async_trait;

use super::error::AuthError;
use super::types::TokenResponse;

/// Token-endpoint operations, abstracted so the token manager can be
/// tested without HTTP.
#[async_trait]
pub trait OAuthClientTrait: Send + Sync {
    /// One-shot exchange of a short-lived grant code for tokens.
    async fn exchange_grant_code(
        &self,
        client_id: &str,
        client_secret: &str,
        grant_code: &str,
    ) -> Result<TokenResponse, AuthError>;

    /// Mint a new access token from a refresh token.
    async fn refresh_access_token(
        &self,
        client_id: &str,
        client_secret: &str,
        refresh_token: &str,
    ) -> Result<TokenResponse, AuthError>;
}

/// Access-token source consumed by the remote client.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// A currently valid access token, refreshing if needed.
    async fn get_access_token(&self) -> Result<String, AuthError>;

    /// Drop the cached token and mint a fresh one (after a 401).
    async fn force_refresh(&self) -> Result<String, AuthError>;
}
