use std::fmt;

use hmac::Hmac;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::{CryptoError, Result};
use crate::constants::{KEY_LEN, PBKDF2_ITERATIONS, PBKDF2_MIN_SALT_LEN};

/// A 256-bit document key. Zeroized on drop; `Debug` shows only the fingerprint.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial([u8; KEY_LEN]);

impl KeyMaterial {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Short public identifier of the key: hex of the first 8 bytes of its SHA-256.
    pub fn fingerprint(&self) -> String {
        let digest: [u8; 32] = Sha256::digest(self.0).into();
        hex::encode(&digest[..8])
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyMaterial({})", self.fingerprint())
    }
}

impl PartialEq for KeyMaterial {
    fn eq(&self, other: &Self) -> bool {
        // Fold instead of short-circuiting so comparison time does not leak a prefix.
        self.0
            .iter()
            .zip(other.0.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl Eq for KeyMaterial {}

/// Derive a document key from a password and salt using PBKDF2-HMAC-SHA256.
pub fn derive_key_with_iterations(
    password: &str,
    salt: &[u8],
    iterations: u32,
) -> Result<KeyMaterial> {
    if salt.len() < PBKDF2_MIN_SALT_LEN {
        return Err(CryptoError::KeyDerivation(format!(
            "salt too short: expected at least {PBKDF2_MIN_SALT_LEN}, got {}",
            salt.len()
        )));
    }
    if iterations == 0 {
        return Err(CryptoError::KeyDerivation(
            "iteration count must be positive".to_string(),
        ));
    }

    let mut output = [0u8; KEY_LEN];
    pbkdf2::pbkdf2::<Hmac<Sha256>>(password.as_bytes(), salt, iterations, &mut output)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    let key = KeyMaterial(output);
    output.zeroize();
    Ok(key)
}

/// Derive a document key with the production iteration count.
pub fn derive_key(password: &str, salt: &[u8]) -> Result<KeyMaterial> {
    derive_key_with_iterations(password, salt, PBKDF2_ITERATIONS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_KEY_SALT;

    #[test]
    fn test_derive_key_deterministic() {
        let salt = [0x42u8; 32];
        let key1 = derive_key_with_iterations("my_strong_password", &salt, 1000).unwrap();
        let key2 = derive_key_with_iterations("my_strong_password", &salt, 1000).unwrap();
        assert_eq!(key1, key2);
    }

    #[test]
    fn test_derive_key_different_passwords() {
        let salt = [0x42u8; 32];
        let key1 = derive_key_with_iterations("password1", &salt, 1000).unwrap();
        let key2 = derive_key_with_iterations("password2", &salt, 1000).unwrap();
        assert_ne!(key1, key2);
    }

    #[test]
    fn test_derive_key_different_salts() {
        let key1 = derive_key_with_iterations("same", &[0x01; 32], 1000).unwrap();
        let key2 = derive_key_with_iterations("same", &[0x02; 32], 1000).unwrap();
        assert_ne!(key1, key2);
    }

    #[test]
    fn test_derive_key_salt_too_short() {
        let result = derive_key_with_iterations("password", &[0x01; 8], 1000);
        assert!(matches!(result, Err(CryptoError::KeyDerivation(_))));
    }

    #[test]
    fn test_default_salt_is_long_enough() {
        assert!(DEFAULT_KEY_SALT.len() >= PBKDF2_MIN_SALT_LEN);
    }

    #[test]
    fn test_production_iterations_match_fast_path() {
        let slow = derive_key("pw", DEFAULT_KEY_SALT).unwrap();
        let fast = derive_key_with_iterations("pw", DEFAULT_KEY_SALT, PBKDF2_ITERATIONS).unwrap();
        assert_eq!(slow, fast);
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = KeyMaterial::from_bytes([0x7F; KEY_LEN]);
        let shown = format!("{key:?}");
        assert!(shown.starts_with("KeyMaterial("));
        assert!(!shown.contains("7f7f7f7f7f7f7f7f7f"));
        assert_eq!(key.fingerprint().len(), 16);
    }
}
