//! Authenticated encryption for blobs kept on local storage.
//!
//! Sealed layout is `nonce (12 bytes) || ciphertext+tag`, ChaCha20-Poly1305
//! with a fresh random nonce per write.

use crate::domain::ports::Storage;
use crate::utils::error::{BordersError, Result};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;
use std::fmt;

pub const KEY_SIZE: usize = 32;
pub const NONCE_SIZE: usize = 12;

/// Environment fallback when `points.key` is not set.
pub const KEY_ENV_VAR: &str = "HISTORIC_BORDERS_POINTS_KEY";

#[derive(Clone, PartialEq, Eq)]
pub struct SealingKey([u8; KEY_SIZE]);

impl fmt::Debug for SealingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SealingKey(..)")
    }
}

impl SealingKey {
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_SIZE];
        rand::rng().fill_bytes(&mut key);
        Self(key)
    }

    /// Parses a 64-character hex key. `field` names the setting in errors.
    pub fn from_hex(field: &str, value: &str) -> Result<Self> {
        let invalid = |reason: String| BordersError::InvalidConfigValueError {
            field: field.to_string(),
            value: "<redacted>".to_string(),
            reason,
        };

        let bytes = hex::decode(value.trim()).map_err(|e| invalid(e.to_string()))?;
        let key: [u8; KEY_SIZE] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| invalid(format!("expected {} bytes, got {}", KEY_SIZE, b.len())))?;
        Ok(Self(key))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    fn cipher(&self) -> Result<ChaCha20Poly1305> {
        ChaCha20Poly1305::new_from_slice(&self.0).map_err(|e| BordersError::CryptoError {
            message: e.to_string(),
        })
    }

    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::rng().fill_bytes(&mut nonce_bytes);

        let ciphertext = self
            .cipher()?
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
            .map_err(|e| BordersError::CryptoError {
                message: format!("encryption failed: {}", e),
            })?;

        let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>> {
        if sealed.len() < NONCE_SIZE {
            return Err(BordersError::CryptoError {
                message: "sealed data too short for nonce".to_string(),
            });
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_SIZE);

        self.cipher()?
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| BordersError::CryptoError {
                message: "wrong key or tampered data".to_string(),
            })
    }

    /// Key from config, then the environment, then `key_file` in `storage`.
    /// A fresh key is generated and written to `key_file` when none exists.
    pub async fn resolve<S: Storage>(
        configured: Option<&str>,
        storage: &S,
        key_file: &str,
    ) -> Result<Self> {
        if let Some(value) = configured.filter(|v| !v.trim().is_empty()) {
            return Self::from_hex("points.key", value);
        }

        if let Ok(value) = std::env::var(KEY_ENV_VAR) {
            if !value.trim().is_empty() {
                return Self::from_hex(KEY_ENV_VAR, &value);
            }
        }

        if storage.exists(key_file).await {
            let bytes = storage.read_file(key_file).await?;
            let value = String::from_utf8_lossy(&bytes);
            return Self::from_hex(key_file, &value);
        }

        tracing::info!("🔑 No points key configured, generating {}", key_file);
        let key = Self::generate();
        storage.write_file(key_file, key.to_hex().as_bytes()).await?;
        Ok(key)
    }
}
