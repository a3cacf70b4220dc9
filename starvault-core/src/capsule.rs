//! Portable `.universe` files: the sealed local snapshot, byte for byte.
//!
//! Export never decrypts or re-encrypts. Import decrypts once against the
//! caller's key purely as a gate; nothing is written here, so a capsule
//! that fails the gate leaves existing state alone.

use chrono::NaiveDate;
use tracing::info;

use crate::codec::{self, Restored};
use crate::constants::CAPSULE_EXTENSION;
use crate::crypto::{KeyMaterial, SealedBlob};
use crate::error::{Result, StarVaultError};
use crate::traits::LocalVault;

/// A capsule that decrypted under the current key, ready to be committed
/// with [`crate::sync::SyncEngine::adopt`].
#[derive(Debug, Clone)]
pub struct Imported {
    pub blob: SealedBlob,
    pub restored: Restored,
}

/// `starvault_YYYYMMDD.universe`
pub fn file_name(date: NaiveDate) -> String {
    format!("starvault_{}.{}", date.format("%Y%m%d"), CAPSULE_EXTENSION)
}

pub async fn export(vault: &dyn LocalVault) -> Result<Vec<u8>> {
    let blob = vault
        .load_snapshot()
        .await?
        .ok_or_else(|| StarVaultError::NotFound("no local snapshot to export".to_string()))?;
    let bytes = blob.to_json()?;
    info!(bytes = bytes.len(), "capsule exported");
    Ok(bytes)
}

pub fn import(bytes: &[u8], key: &KeyMaterial) -> Result<Imported> {
    let blob = SealedBlob::from_json(bytes)?;
    let restored = codec::open(&blob, key)?;
    info!(nodes = restored.cosmos.len(), "capsule verified");
    Ok(Imported { blob, restored })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Cosmos;
    use crate::vault::MemoryVault;

    fn key(byte: u8) -> KeyMaterial {
        KeyMaterial::from_bytes([byte; 32])
    }

    #[test]
    fn test_file_name_format() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(file_name(date), "starvault_20240307.universe");
    }

    #[tokio::test]
    async fn test_export_without_snapshot_is_not_found() {
        let vault = MemoryVault::new();
        assert!(matches!(export(&vault).await, Err(StarVaultError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_export_is_the_stored_blob() {
        let vault = MemoryVault::new();
        let blob = codec::seal(&Cosmos::genesis("Home"), &key(1)).unwrap();
        vault.save_snapshot(&blob).await.unwrap();

        let bytes = export(&vault).await.unwrap();
        assert_eq!(SealedBlob::from_json(&bytes).unwrap(), blob);

        let imported = import(&bytes, &key(1)).unwrap();
        assert_eq!(imported.blob, blob);
        assert_eq!(imported.restored.cosmos.root().name, "Home");
    }

    #[test]
    fn test_import_with_other_key_fails_decryption() {
        let blob = codec::seal(&Cosmos::genesis("Home"), &key(1)).unwrap();
        let bytes = blob.to_json().unwrap();
        assert!(matches!(import(&bytes, &key(9)), Err(StarVaultError::Decryption)));
    }

    #[test]
    fn test_import_rejects_non_capsule() {
        assert!(matches!(
            import(b"{\"hello\":1}", &key(1)),
            Err(StarVaultError::Serialization(_))
        ));
        assert!(matches!(
            import(b"plain text", &key(1)),
            Err(StarVaultError::Serialization(_))
        ));
    }

    #[test]
    fn test_import_accepts_legacy_iv_field() {
        let blob = codec::seal(&Cosmos::new("Old"), &key(1)).unwrap();
        let legacy = format!(
            r#"{{"cipher":"{}","iv":"{}"}}"#,
            blob.cipher_b64(),
            blob.nonce_b64()
        );
        let imported = import(legacy.as_bytes(), &key(1)).unwrap();
        assert_eq!(imported.restored.cosmos.root().name, "Old");
    }
}
