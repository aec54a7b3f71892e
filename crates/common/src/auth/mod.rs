//! OAuth2 credential lifecycle.
//!
//! - [`OAuthClient`]: token-endpoint HTTP client (grant-code exchange and
//!   refresh)
//! - [`CredentialStore`]: encrypted persistence of the client credential
//!   and cached access token
//! - [`TokenManager`]: expiry tracking, margin-based refresh with
//!   single-flight serialization, and the try-refresh-then-exchange
//!   connect protocol

pub mod client;
pub mod credential_store;
pub mod error;
pub mod token_manager;
pub mod traits;
pub mod types;

pub use client::OAuthClient;
pub use credential_store::CredentialStore;
pub use error::AuthError;
pub use token_manager::TokenManager;
pub use traits::{OAuthClientTrait, TokenProvider};
pub use types::{AccessToken, Credential, TokenResponse};
