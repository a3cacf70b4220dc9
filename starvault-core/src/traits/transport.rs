use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::SealedBlob;
use crate::error::StarVaultError;

/// The per-user record held by the remote store. Both payload fields are
/// base64; the store cannot read them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteDocument {
    pub encrypted_data: String,
    #[serde(alias = "iv")]
    pub nonce: String,
    pub updated_at: DateTime<Utc>,
}

impl RemoteDocument {
    pub fn from_blob(blob: &SealedBlob, updated_at: DateTime<Utc>) -> Self {
        Self {
            encrypted_data: blob.cipher_b64(),
            nonce: blob.nonce_b64(),
            updated_at,
        }
    }

    pub fn to_blob(&self) -> Result<SealedBlob, StarVaultError> {
        SealedBlob::from_b64(&self.encrypted_data, &self.nonce)
    }
}

/// Per-user document storage keyed by user id, last write wins.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn upsert(&self, user_id: &str, doc: &RemoteDocument) -> Result<(), StarVaultError>;
    /// Read straight from the server, bypassing any cache. `None` means the
    /// user has never saved.
    async fn fetch_authoritative(
        &self,
        user_id: &str,
    ) -> Result<Option<RemoteDocument>, StarVaultError>;
    async fn delete(&self, user_id: &str) -> Result<(), StarVaultError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_document_wire_names() {
        let blob = SealedBlob {
            cipher: vec![1, 2, 3],
            nonce: vec![0; 12],
        };
        let doc = RemoteDocument::from_blob(&blob, Utc::now());
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["encryptedData"], "AQID");
        assert!(json.get("updatedAt").is_some());
        assert_eq!(doc.to_blob().unwrap(), blob);
    }
}
