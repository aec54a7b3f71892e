//! AES-256-GCM encryption primitives.
//!
//! Used by the credential store to encrypt the OAuth credential blob before
//! it is handed to the host's settings storage. Keys are either supplied
//! raw (32 bytes) or derived from an installation passphrase via Argon2.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use argon2::password_hash::rand_core::{OsRng, RngCore};
use argon2::password_hash::SaltString;
use argon2::Argon2;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{CommonError, CommonResult};

const ALGORITHM: &str = "AES-256-GCM";
const NONCE_LEN: usize = 12;

/// Serializable encrypted payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedData {
    pub nonce: Vec<u8>,
    pub ciphertext: Vec<u8>,
    pub salt: Option<String>,
    pub algorithm: String,
}

/// AES-GCM encryption service with optional password-based key derivation.
pub struct EncryptionService {
    cipher: Aes256Gcm,
    password_salt: Option<String>,
}

impl std::fmt::Debug for EncryptionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionService")
            .field("key", &"[REDACTED]")
            .field("password_salt", &self.password_salt.is_some())
            .finish()
    }
}

impl EncryptionService {
    /// Create a new encryption service from a raw 32-byte key.
    pub fn new(key: &[u8]) -> CommonResult<Self> {
        if key.len() != 32 {
            return Err(CommonError::Crypto("encryption key must be exactly 32 bytes".to_string()));
        }

        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| CommonError::Crypto(format!("failed to create cipher: {e}")))?;

        Ok(Self { cipher, password_salt: None })
    }

    /// Derive the encryption key from a passphrase using Argon2.
    ///
    /// Pass the salt of a previously derived key to reproduce it; omit it
    /// to generate a fresh salt (available via [`EncryptionService::salt`]).
    pub fn from_password(password: &str, salt: Option<&str>) -> CommonResult<Self> {
        let salt = match salt {
            Some(existing) => SaltString::from_b64(existing)
                .map_err(|e| CommonError::Crypto(format!("invalid password salt: {e}")))?,
            None => SaltString::generate(OsRng),
        };

        let mut key = [0u8; 32];
        Argon2::default()
            .hash_password_into(password.as_bytes(), salt.as_str().as_bytes(), &mut key)
            .map_err(|e| CommonError::Crypto(format!("key derivation failed: {e}")))?;

        let mut service = Self::new(&key)?;
        service.password_salt = Some(salt.to_string());
        Ok(service)
    }

    /// Generate a random 32-byte symmetric key.
    #[must_use]
    pub fn generate_key() -> Vec<u8> {
        let mut key = vec![0u8; 32];
        OsRng.fill_bytes(&mut key);
        key
    }

    /// Salt of a password-derived key, `None` for raw keys.
    #[must_use]
    pub fn salt(&self) -> Option<&str> {
        self.password_salt.as_deref()
    }

    /// Encrypt bytes into an [`EncryptedData`] payload.
    pub fn encrypt(&self, data: &[u8]) -> CommonResult<EncryptedData> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let ciphertext = self
            .cipher
            .encrypt(&Nonce::from(nonce), data)
            .map_err(|e| CommonError::Crypto(format!("encryption failed: {e}")))?;

        Ok(EncryptedData {
            nonce: nonce.to_vec(),
            ciphertext,
            salt: self.password_salt.clone(),
            algorithm: ALGORITHM.to_string(),
        })
    }

    /// Decrypt an [`EncryptedData`] payload back into raw bytes.
    pub fn decrypt(&self, encrypted: &EncryptedData) -> CommonResult<Vec<u8>> {
        if encrypted.algorithm != ALGORITHM {
            return Err(CommonError::Crypto(format!(
                "unsupported algorithm: {}",
                encrypted.algorithm
            )));
        }

        let nonce: [u8; NONCE_LEN] = encrypted
            .nonce
            .as_slice()
            .try_into()
            .map_err(|_| CommonError::Crypto("nonce must be exactly 12 bytes".to_string()))?;

        self.cipher
            .decrypt(&Nonce::from(nonce), encrypted.ciphertext.as_ref())
            .map_err(|e| CommonError::Crypto(format!("decryption failed: {e}")))
    }

    /// Encrypt bytes and encode the payload as a single base64 string.
    pub fn encrypt_to_string(&self, data: &[u8]) -> CommonResult<String> {
        let encrypted = self.encrypt(data)?;
        let serialized = serde_json::to_vec(&encrypted)?;
        Ok(BASE64.encode(serialized))
    }

    /// Decode a base64 string and decrypt the contained payload.
    pub fn decrypt_from_string(&self, encrypted_str: &str) -> CommonResult<Vec<u8>> {
        let decoded = BASE64
            .decode(encrypted_str)
            .map_err(|e| CommonError::Crypto(format!("base64 decode failed: {e}")))?;
        let encrypted: EncryptedData = serde_json::from_slice(&decoded)?;
        self.decrypt(&encrypted)
    }
}
