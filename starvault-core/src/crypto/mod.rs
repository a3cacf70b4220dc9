//! Password-derived keys and authenticated encryption of opaque blobs.
//!
//! Nothing in this module performs I/O or logs key material or plaintext.

pub mod pbkdf2;
pub mod aes_gcm;
pub mod sealed;

pub use self::aes_gcm::{decrypt, encrypt};
pub use self::pbkdf2::{derive_key, derive_key_with_iterations, KeyMaterial};
pub use self::sealed::SealedBlob;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("PBKDF2 derivation failed: {0}")]
    KeyDerivation(String),
    #[error("AES-GCM encryption failed: {0}")]
    Encrypt(String),
    /// Wrong key, corrupted ciphertext or tampering.
    #[error("AES-GCM decryption failed")]
    Decryption,
    #[error("Invalid key length: expected {expected}, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },
    #[error("OS randomness unavailable: {0}")]
    Random(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
