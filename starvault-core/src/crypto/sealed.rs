use serde::{Deserialize, Serialize};

use crate::error::{Result, StarVaultError};

/// An AEAD ciphertext and the nonce it was sealed under.
///
/// The JSON form is `{"cipher": base64, "nonce": base64}`; this is the shape
/// of the local snapshot slot and of exported capsule files. Older files
/// that name the nonce `iv` are still readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedBlob {
    #[serde(with = "b64")]
    pub cipher: Vec<u8>,
    #[serde(with = "b64", alias = "iv")]
    pub nonce: Vec<u8>,
}

impl SealedBlob {
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| StarVaultError::Serialization(format!("not a sealed capsule: {e}")))
    }

    pub fn cipher_b64(&self) -> String {
        b64::encode(&self.cipher)
    }

    pub fn nonce_b64(&self) -> String {
        b64::encode(&self.nonce)
    }

    /// Rebuild from the base64 fields of a remote document.
    pub fn from_b64(cipher: &str, nonce: &str) -> Result<Self> {
        Ok(Self {
            cipher: b64::decode(cipher)
                .map_err(|e| StarVaultError::Serialization(format!("cipher is not base64: {e}")))?,
            nonce: b64::decode(nonce)
                .map_err(|e| StarVaultError::Serialization(format!("nonce is not base64: {e}")))?,
        })
    }
}

pub(crate) mod b64 {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn encode(bytes: &[u8]) -> String {
        STANDARD.encode(bytes)
    }

    pub fn decode(text: &str) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(text)
    }

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        decode(&text).map_err(serde::de::Error::custom)
    }
}
