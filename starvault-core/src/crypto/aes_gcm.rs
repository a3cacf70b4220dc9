use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};

use super::{CryptoError, KeyMaterial, Result, SealedBlob};
use crate::constants::{KEY_LEN, NONCE_LEN};

fn cipher_for(key: &KeyMaterial) -> Result<Aes256Gcm> {
    Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| CryptoError::InvalidKeyLength {
        expected: KEY_LEN,
        got: key.as_bytes().len(),
    })
}

/// Draw a fresh nonce from the OS CSPRNG. Callers never supply one.
fn fresh_nonce() -> Result<[u8; NONCE_LEN]> {
    let mut nonce = [0u8; NONCE_LEN];
    getrandom::getrandom(&mut nonce).map_err(|e| CryptoError::Random(e.to_string()))?;
    Ok(nonce)
}

/// Encrypt with AES-256-GCM under a fresh random nonce.
///
/// The returned ciphertext carries the 16-byte authentication tag appended.
pub fn encrypt(plaintext: &[u8], key: &KeyMaterial) -> Result<SealedBlob> {
    let cipher = cipher_for(key)?;
    let nonce = fresh_nonce()?;

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|e| CryptoError::Encrypt(e.to_string()))?;

    Ok(SealedBlob {
        cipher: ciphertext,
        nonce: nonce.to_vec(),
    })
}

/// Decrypt and authenticate a sealed blob.
///
/// Any failure (wrong key, flipped bit, truncated input, malformed nonce) is
/// reported as [`CryptoError::Decryption`] and no partial plaintext escapes.
pub fn decrypt(sealed: &SealedBlob, key: &KeyMaterial) -> Result<Vec<u8>> {
    if sealed.nonce.len() != NONCE_LEN {
        return Err(CryptoError::Decryption);
    }

    let cipher = cipher_for(key)?;
    cipher
        .decrypt(Nonce::from_slice(&sealed.nonce), sealed.cipher.as_slice())
        .map_err(|_| CryptoError::Decryption)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::crypto::derive_key_with_iterations;

    fn key(password: &str) -> KeyMaterial {
        derive_key_with_iterations(password, &[0x42; 32], 1000).unwrap()
    }

    #[test]
    fn test_roundtrip() {
        let key = key("correct horse");
        let plaintext = b"{\"root\":{\"name\":\"A\",\"nodes\":[]}}";

        let sealed = encrypt(plaintext, &key).unwrap();
        assert_ne!(&sealed.cipher[..plaintext.len()], &plaintext[..]);
        assert_eq!(sealed.cipher.len(), plaintext.len() + 16);

        let decrypted = decrypt(&sealed, &key).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_empty_plaintext() {
        let key = key("pw");
        let sealed = encrypt(b"", &key).unwrap();
        assert_eq!(decrypt(&sealed, &key).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_wrong_password_rejected() {
        let sealed = encrypt(b"secret", &key("right")).unwrap();
        let result = decrypt(&sealed, &key("wrong"));
        assert!(matches!(result, Err(CryptoError::Decryption)));
    }

    #[test]
    fn test_wrong_key_rejected_many_passwords() {
        let sealed = encrypt(b"secret universe", &key("owner")).unwrap();
        for i in 0..200 {
            let other = derive_key_with_iterations(&format!("guess-{i}"), &[0x42; 32], 1).unwrap();
            assert!(decrypt(&sealed, &other).is_err());
        }
    }

    #[test]
    fn test_tampered_ciphertext_rejected() {
        let key = key("pw");
        let mut sealed = encrypt(b"tamper me", &key).unwrap();
        sealed.cipher[0] ^= 0x01;
        assert!(matches!(decrypt(&sealed, &key), Err(CryptoError::Decryption)));
    }

    #[test]
    fn test_malformed_nonce_rejected() {
        let key = key("pw");
        let mut sealed = encrypt(b"data", &key).unwrap();
        sealed.nonce.truncate(5);
        assert!(matches!(decrypt(&sealed, &key), Err(CryptoError::Decryption)));
    }

    #[test]
    fn test_nonce_never_repeats() {
        let key = key("pw");
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            let sealed = encrypt(b"x", &key).unwrap();
            assert!(seen.insert(sealed.nonce), "nonce reused");
        }
    }
}
