//! Error type for auth operations.

/// Error type for OAuth client, credential store, and token manager
/// operations.
#[derive(Debug)]
pub enum AuthError {
    /// No credential has been saved yet (not connected).
    NotConfigured,

    /// The provider rejected the refresh token. Terminal: the stored
    /// credential is permanently invalid and needs manual re-authorization.
    RefreshDenied(String),

    /// The provider rejected the request for another reason (bad grant
    /// code, bad client credentials).
    Provider(String),

    /// HTTP transport failure talking to the token endpoint.
    RequestFailed(String),

    /// The provider response could not be parsed.
    ParseError(String),

    /// Reading or writing the credential blob failed.
    Storage(String),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotConfigured => write!(f, "Not configured (no credentials saved)"),
            Self::RefreshDenied(msg) => write!(f, "Refresh token rejected: {msg}"),
            Self::Provider(msg) => write!(f, "OAuth provider error: {msg}"),
            Self::RequestFailed(msg) => write!(f, "HTTP request failed: {msg}"),
            Self::ParseError(msg) => write!(f, "Parse error: {msg}"),
            Self::Storage(msg) => write!(f, "Credential storage error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        Self::RequestFailed(err.to_string())
    }
}

impl From<crate::error::CommonError> for AuthError {
    fn from(err: crate::error::CommonError) -> Self {
        Self::Storage(err.to_string())
    }
}
