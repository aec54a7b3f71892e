//! Token manager with automatic refresh
//!
//! Manages the OAuth token lifecycle:
//! - Encrypted credential persistence via [`CredentialStore`]
//! - Auto-refresh before expiry (configurable margin, default 5 min)
//! - Single-flight refresh: concurrent callers needing a refresh share one
//!   underlying request, since refresh tokens can be single-use
//! - The connect protocol: a saved value is first tried as a refresh
//!   token, then re-interpreted as a grant code if the provider rejects it

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::credential_store::CredentialStore;
use super::error::AuthError;
use super::traits::{OAuthClientTrait, TokenProvider};
use super::types::{AccessToken, Credential, TokenResponse};

/// Default refresh margin: refresh tokens this many seconds before expiry.
pub const DEFAULT_REFRESH_MARGIN_SECONDS: i64 = 300;

/// OAuth token lifecycle manager.
pub struct TokenManager<C: OAuthClientTrait + 'static> {
    oauth_client: Arc<C>,
    credentials: Arc<CredentialStore>,
    current_token: RwLock<Option<AccessToken>>,
    refresh_margin_seconds: i64,
    /// Serializes every token-endpoint mutation (refresh, exchange).
    refresh_lock: Mutex<()>,
}

impl<C: OAuthClientTrait + 'static> TokenManager<C> {
    #[must_use]
    pub fn new(oauth_client: C, credentials: Arc<CredentialStore>) -> Self {
        Self::with_refresh_margin(oauth_client, credentials, DEFAULT_REFRESH_MARGIN_SECONDS)
    }

    /// Create a manager with a custom refresh margin.
    #[must_use]
    pub fn with_refresh_margin(
        oauth_client: C,
        credentials: Arc<CredentialStore>,
        refresh_margin_seconds: i64,
    ) -> Self {
        Self {
            oauth_client: Arc::new(oauth_client),
            credentials,
            current_token: RwLock::new(None),
            refresh_margin_seconds,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Load any persisted access token into memory.
    ///
    /// Call once on startup; returns whether a token was found.
    pub async fn initialize(&self) -> Result<bool, AuthError> {
        match self.credentials.load_access_token()? {
            Some(token) => {
                *self.current_token.write().await = Some(token);
                debug!("token manager initialized with persisted access token");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// True iff client id, client secret, and refresh token are all
    /// present and non-empty.
    pub fn has_credentials(&self) -> Result<bool, AuthError> {
        Ok(self.credentials.load()?.is_some_and(|c| c.is_complete()))
    }

    /// Save a credential set, validating it against the provider.
    ///
    /// `value` is first attempted as a refresh token; when the provider
    /// rejects it, it is re-interpreted as a grant code and exchanged.
    /// This order is deliberate: a stale refresh token mistaken for a
    /// grant code would fail loudly at the provider, while the reverse
    /// could silently succeed with the wrong semantics. Transport
    /// failures propagate without triggering the fallback.
    pub async fn save_credentials(
        &self,
        client_id: &str,
        client_secret: &str,
        value: &str,
        datacenter: &str,
    ) -> Result<(), AuthError> {
        let _guard = self.refresh_lock.lock().await;

        let mut credential = Credential {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            refresh_token: value.to_string(),
            datacenter: datacenter.to_string(),
        };

        let response = match self
            .oauth_client
            .refresh_access_token(client_id, client_secret, value)
            .await
        {
            Ok(response) => {
                debug!("value accepted as refresh token");
                response
            }
            Err(AuthError::RefreshDenied(code)) | Err(AuthError::Provider(code)) => {
                info!(rejection = %code, "value rejected as refresh token, exchanging as grant code");
                let response =
                    self.oauth_client.exchange_grant_code(client_id, client_secret, value).await?;
                credential.refresh_token = response.refresh_token.clone().ok_or_else(|| {
                    AuthError::ParseError("grant-code exchange returned no refresh token".into())
                })?;
                response
            }
            Err(e) => return Err(e),
        };

        self.store_validated(credential, response).await?;
        info!("credentials saved");
        Ok(())
    }

    /// Store an access token with a computed absolute expiry.
    pub async fn save_access_token(
        &self,
        token: &str,
        expires_in_seconds: i64,
    ) -> Result<(), AuthError> {
        let token = AccessToken::new(token.to_string(), expires_in_seconds);
        self.credentials.save_access_token(&token)?;
        *self.current_token.write().await = Some(token);
        Ok(())
    }

    /// Get a valid access token, refreshing when absent or within the
    /// expiry margin.
    ///
    /// # Errors
    /// Returns [`AuthError::RefreshDenied`] when the provider rejects the
    /// refresh token — terminal until the operator re-authorizes.
    pub async fn get_access_token(&self) -> Result<String, AuthError> {
        if let Some(token) = self.cached_valid().await {
            return Ok(token);
        }

        // Single-flight: whoever wins the lock refreshes; everyone else
        // finds the fresh token on re-check.
        let _guard = self.refresh_lock.lock().await;
        if let Some(token) = self.cached_valid().await {
            return Ok(token);
        }
        self.refresh_locked().await
    }

    /// Drop the cached token and mint a fresh one.
    ///
    /// Used after a 401: the cached token was just rejected, so the
    /// margin check cannot be trusted.
    pub async fn force_refresh(&self) -> Result<String, AuthError> {
        *self.current_token.write().await = None;

        let _guard = self.refresh_lock.lock().await;
        // A refresh that was already in flight may have repopulated the
        // cache while we waited.
        if let Some(token) = self.cached_valid().await {
            return Ok(token);
        }
        self.refresh_locked().await
    }

    /// Forget the credential set (explicit re-authorization path).
    pub async fn clear_credentials(&self) -> Result<(), AuthError> {
        self.credentials.clear()?;
        *self.current_token.write().await = None;
        info!("credentials cleared");
        Ok(())
    }

    async fn cached_valid(&self) -> Option<String> {
        let token = self.current_token.read().await;
        token
            .as_ref()
            .filter(|t| !t.is_expired(self.refresh_margin_seconds))
            .map(|t| t.token.clone())
    }

    /// Refresh using the stored credential. Caller must hold `refresh_lock`.
    async fn refresh_locked(&self) -> Result<String, AuthError> {
        let credential = self.credentials.load()?.ok_or(AuthError::NotConfigured)?;

        debug!("refreshing access token");
        let response = self
            .oauth_client
            .refresh_access_token(
                &credential.client_id,
                &credential.client_secret,
                &credential.refresh_token,
            )
            .await
            .map_err(|e| {
                if matches!(e, AuthError::RefreshDenied(_)) {
                    warn!("refresh token rejected; manual re-authorization required");
                }
                e
            })?;

        let token = self.store_validated(credential, response).await?;
        Ok(token)
    }

    /// Persist a credential plus the token response that validated it.
    /// Caller must hold `refresh_lock`.
    async fn store_validated(
        &self,
        mut credential: Credential,
        response: TokenResponse,
    ) -> Result<String, AuthError> {
        // Some provider configurations rotate the refresh token on use.
        if let Some(rotated) = &response.refresh_token {
            if *rotated != credential.refresh_token {
                credential.refresh_token = rotated.clone();
            }
        }
        self.credentials.save(&credential)?;

        let token = AccessToken::new(response.access_token, response.expires_in);
        self.credentials.save_access_token(&token)?;
        let value = token.token.clone();
        *self.current_token.write().await = Some(token);
        Ok(value)
    }
}

#[async_trait]
impl<C: OAuthClientTrait + 'static> TokenProvider for TokenManager<C> {
    async fn get_access_token(&self) -> Result<String, AuthError> {
        self.get_access_token().await
    }

    async fn force_refresh(&self) -> Result<String, AuthError> {
        self.force_refresh().await
    }
}
