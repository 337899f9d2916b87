//! # Shared Crypto - Telegram Envelope
//!
//! Symmetric authenticated encryption shared by the update decoder and the
//! vulnerability ledger parser.
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `symmetric` | AES-256-GCM | Telegram sealing/opening |
//! | `hashing` | SHA-256 | Password → key derivation |
//!
//! ## Wire Envelope
//!
//! ```text
//! hex( nonce[12] || ciphertext || tag[16] )
//! ```
//!
//! The key is `SHA-256(competition password)`. Any truncated, tampered or
//! wrong-key payload surfaces as a `CryptoError`, never a panic.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod hashing;
pub mod symmetric;

// Re-exports
pub use errors::CryptoError;
pub use hashing::{derive_key, sha256};
pub use symmetric::{SecretKey, TelegramCipher, NONCE_LEN, TAG_LEN};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
