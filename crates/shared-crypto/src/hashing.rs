//! # SHA-256 Hashing
//!
//! Key derivation for the telegram envelope. Agents and server derive the
//! same 256-bit key from the shared competition password.

use sha2::{Digest, Sha256};

use crate::symmetric::SecretKey;

/// SHA-256 output (256-bit).
pub type Hash = [u8; 32];

/// Hash data with SHA-256 (one-shot).
pub fn sha256(data: &[u8]) -> Hash {
    Sha256::digest(data).into()
}

/// Derive the envelope key from a password.
pub fn derive_key(password: &str) -> SecretKey {
    SecretKey::from_bytes(sha256(password.as_bytes()))
}
