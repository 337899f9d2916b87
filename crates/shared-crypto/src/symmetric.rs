//! # Symmetric Encryption
//!
//! AES-256-GCM with a random 96-bit nonce prepended to the ciphertext.
//!
//! ## Security Properties
//!
//! - Authenticated: any bit flip in nonce, ciphertext or tag fails `open`
//! - Key material is zeroized on drop

use crate::{hashing::derive_key, CryptoError};
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use zeroize::Zeroize;

/// GCM nonce length in bytes.
pub const NONCE_LEN: usize = 12;

/// GCM authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

/// Secret key (256-bit).
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SecretKey([u8; 32]);

impl SecretKey {
    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get inner bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretKey(..)")
    }
}

/// Seals and opens telegram envelopes under one shared key.
#[derive(Clone, Debug)]
pub struct TelegramCipher {
    key: SecretKey,
}

impl TelegramCipher {
    /// Build a cipher from an already-derived key.
    pub fn new(key: SecretKey) -> Self {
        Self { key }
    }

    /// Build a cipher keyed by `SHA-256(password)`.
    pub fn from_password(password: &str) -> Self {
        Self::new(derive_key(password))
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(self.key.as_bytes().into())
    }

    /// Encrypt `plaintext`, returning `nonce || ciphertext || tag`.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::EncryptionFailed` if encryption fails.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut nonce);

        let ciphertext = self
            .cipher()
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// Decrypt a `nonce || ciphertext || tag` payload.
    ///
    /// # Errors
    ///
    /// `CryptoError::Truncated` when the payload cannot hold a nonce and tag,
    /// `CryptoError::DecryptionFailed` on authentication failure.
    pub fn open(&self, payload: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if payload.len() < NONCE_LEN + TAG_LEN {
            return Err(CryptoError::Truncated {
                min: NONCE_LEN + TAG_LEN,
                actual: payload.len(),
            });
        }
        let (nonce, ciphertext) = payload.split_at(NONCE_LEN);
        self.cipher()
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CryptoError::DecryptionFailed)
    }

    /// Seal and hex-encode for transport.
    pub fn seal_hex(&self, plaintext: &[u8]) -> Result<String, CryptoError> {
        self.seal(plaintext).map(hex::encode)
    }

    /// Hex-decode and open a transport string.
    pub fn open_hex(&self, encoded: &str) -> Result<Vec<u8>, CryptoError> {
        let payload =
            hex::decode(encoded).map_err(|e| CryptoError::InvalidEncoding(e.to_string()))?;
        self.open(&payload)
    }
}
