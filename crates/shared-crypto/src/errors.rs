//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Encryption failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Authentication tag mismatch, wrong key, or corrupted ciphertext
    #[error("Decryption failed")]
    DecryptionFailed,

    /// Payload shorter than nonce + tag
    #[error("Payload truncated: need at least {min} bytes, got {actual}")]
    Truncated {
        /// Minimum envelope length in bytes
        min: usize,
        /// Actual payload length in bytes
        actual: usize,
    },

    /// Transport encoding is not valid hex
    #[error("Invalid hex encoding: {0}")]
    InvalidEncoding(String),
}
