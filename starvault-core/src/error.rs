use thiserror::Error;

#[derive(Error, Debug)]
pub enum StarVaultError {
    #[error("Crypto error: {0}")]
    Crypto(crate::crypto::CryptoError),

    /// Wrong password, corrupted ciphertext and tampering all land here;
    /// AEAD cannot tell them apart.
    #[error("Decryption failed: the password is wrong or the data is corrupted")]
    Decryption,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Remote error: {0}")]
    Remote(String),

    #[error("Remote request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Malformed document: {0}")]
    Malformed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Platform error: {0}")]
    Platform(String),
}

impl From<crate::crypto::CryptoError> for StarVaultError {
    fn from(err: crate::crypto::CryptoError) -> Self {
        match err {
            crate::crypto::CryptoError::Decryption => StarVaultError::Decryption,
            other => StarVaultError::Crypto(other),
        }
    }
}

impl From<serde_json::Error> for StarVaultError {
    fn from(err: serde_json::Error) -> Self {
        StarVaultError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StarVaultError>;
