//! OAuth 2.0 token-endpoint client.
//!
//! Handles the two server-to-server flows the sync engine needs:
//! grant-code exchange and refresh-token refresh. The provider returns
//! application errors both as non-2xx statuses and as 2xx bodies carrying
//! an `error` field, so both shapes are normalized here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::error::AuthError;
use super::traits::OAuthClientTrait;
use super::types::TokenResponse;

/// Error codes that mean the presented refresh token is permanently
/// invalid rather than the request being malformed.
const DENIED_CODES: [&str; 2] = ["access_denied", "invalid_grant"];

/// Token-endpoint HTTP client.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    client: Client,
    token_url: String,
}

impl OAuthClient {
    /// Create a client for the given accounts host
    /// (e.g. `https://accounts.ledgerhost.eu`).
    #[must_use]
    pub fn new(accounts_base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, token_url: format!("{}/oauth/v2/token", accounts_base_url.trim_end_matches('/')) }
    }

    /// The resolved token endpoint URL.
    #[must_use]
    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    async fn token_request(
        &self,
        params: &[(&str, &str)],
        refresh_flow: bool,
    ) -> Result<TokenResponse, AuthError> {
        let response = self.client.post(&self.token_url).form(params).send().await?;
        let status = response.status();
        let body: Value =
            response.json().await.map_err(|e| AuthError::ParseError(e.to_string()))?;

        // Application errors arrive as an `error` field, with or without
        // an error status.
        if let Some(code) = body.get("error").and_then(Value::as_str) {
            debug!(%status, error = code, "token endpoint rejected request");
            if refresh_flow && DENIED_CODES.contains(&code) {
                return Err(AuthError::RefreshDenied(code.to_string()));
            }
            return Err(AuthError::Provider(code.to_string()));
        }

        if !status.is_success() {
            return Err(AuthError::Provider(format!("token endpoint returned {status}")));
        }

        serde_json::from_value(body).map_err(|e| AuthError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl OAuthClientTrait for OAuthClient {
    async fn exchange_grant_code(
        &self,
        client_id: &str,
        client_secret: &str,
        grant_code: &str,
    ) -> Result<TokenResponse, AuthError> {
        debug!("exchanging grant code for tokens");
        self.token_request(
            &[
                ("grant_type", "authorization_code"),
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("code", grant_code),
            ],
            false,
        )
        .await
    }

    async fn refresh_access_token(
        &self,
        client_id: &str,
        client_secret: &str,
        refresh_token: &str,
    ) -> Result<TokenResponse, AuthError> {
        if refresh_token.is_empty() {
            return Err(AuthError::NotConfigured);
        }

        debug!("refreshing access token");
        self.token_request(
            &[
                ("grant_type", "refresh_token"),
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("refresh_token", refresh_token),
            ],
            true,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_url_is_built_from_accounts_host() {
        let client = OAuthClient::new("https://accounts.ledgerhost.eu/");
        assert_eq!(client.token_url(), "https://accounts.ledgerhost.eu/oauth/v2/token");
    }

    #[tokio::test]
    async fn refresh_with_empty_token_is_not_configured() {
        let client = OAuthClient::new("https://accounts.ledgerhost.com");
        let result = client.refresh_access_token("id", "secret", "").await;
        assert!(matches!(result, Err(AuthError::NotConfigured)));
    }
}
