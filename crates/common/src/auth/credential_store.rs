//! Encrypted credential persistence.
//!
//! Serializes the [`Credential`] and cached [`AccessToken`] with
//! serde_json, encrypts them with AES-256-GCM, and hands the resulting
//! blob to the host's [`SettingsStore`]. The store never deletes a
//! credential on its own; `clear` exists for explicit re-authorization.

use std::sync::Arc;

use super::error::AuthError;
use super::types::{AccessToken, Credential};
use crate::crypto::EncryptionService;
use crate::storage::SettingsStore;

const CREDENTIAL_KEY: &str = "ledgersync.credential";
const ACCESS_TOKEN_KEY: &str = "ledgersync.access_token";

/// Encrypted persistence for one credential set.
pub struct CredentialStore {
    store: Arc<dyn SettingsStore>,
    crypto: EncryptionService,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore").finish_non_exhaustive()
    }
}

impl CredentialStore {
    #[must_use]
    pub fn new(store: Arc<dyn SettingsStore>, crypto: EncryptionService) -> Self {
        Self { store, crypto }
    }

    /// Load the stored credential, `None` when not yet connected.
    pub fn load(&self) -> Result<Option<Credential>, AuthError> {
        self.read_encrypted(CREDENTIAL_KEY)
    }

    /// Overwrite the credential atomically.
    pub fn save(&self, credential: &Credential) -> Result<(), AuthError> {
        self.write_encrypted(CREDENTIAL_KEY, credential)
    }

    /// Remove the credential and any cached access token.
    pub fn clear(&self) -> Result<(), AuthError> {
        self.store.remove(CREDENTIAL_KEY)?;
        self.store.remove(ACCESS_TOKEN_KEY)?;
        Ok(())
    }

    /// Load the cached access token, if one was persisted.
    pub fn load_access_token(&self) -> Result<Option<AccessToken>, AuthError> {
        self.read_encrypted(ACCESS_TOKEN_KEY)
    }

    /// Persist the cached access token.
    pub fn save_access_token(&self, token: &AccessToken) -> Result<(), AuthError> {
        self.write_encrypted(ACCESS_TOKEN_KEY, token)
    }

    fn read_encrypted<T: serde::de::DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, AuthError> {
        let Some(blob) = self.store.get(key)? else {
            return Ok(None);
        };

        let plaintext = self.crypto.decrypt_from_string(&blob)?;
        let value =
            serde_json::from_slice(&plaintext).map_err(|e| AuthError::ParseError(e.to_string()))?;
        Ok(Some(value))
    }

    fn write_encrypted<T: serde::Serialize>(&self, key: &str, value: &T) -> Result<(), AuthError> {
        let plaintext =
            serde_json::to_vec(value).map_err(|e| AuthError::ParseError(e.to_string()))?;
        let blob = self.crypto.encrypt_to_string(&plaintext)?;
        self.store.set(key, &blob)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemorySettingsStore;

    fn create_store() -> (Arc<MemorySettingsStore>, CredentialStore) {
        let settings = Arc::new(MemorySettingsStore::new());
        let crypto = EncryptionService::new(&EncryptionService::generate_key()).unwrap();
        let store = CredentialStore::new(settings.clone(), crypto);
        (settings, store)
    }

    fn sample_credential() -> Credential {
        Credential {
            client_id: "client-1".into(),
            client_secret: "secret-1".into(),
            refresh_token: "refresh-1".into(),
            datacenter: "us".into(),
        }
    }

    #[test]
    fn credential_round_trip() {
        let (_, store) = create_store();
        assert!(store.load().unwrap().is_none());

        store.save(&sample_credential()).unwrap();
        assert_eq!(store.load().unwrap(), Some(sample_credential()));
    }

    #[test]
    fn blob_is_not_plaintext() {
        let (settings, store) = create_store();
        store.save(&sample_credential()).unwrap();

        let raw = settings.get("ledgersync.credential").unwrap().unwrap();
        assert!(!raw.contains("secret-1"));
        assert!(!raw.contains("refresh-1"));
    }

    #[test]
    fn clear_removes_credential_and_token() {
        let (_, store) = create_store();
        store.save(&sample_credential()).unwrap();
        store.save_access_token(&AccessToken::new("tok".into(), 3600)).unwrap();

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        assert!(store.load_access_token().unwrap().is_none());
    }
}
