use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use starvault_core::capsule;
use starvault_core::constants::DEFAULT_KEY_SALT;
use starvault_core::crypto::derive_key;
use starvault_core::error::StarVaultError;
use starvault_core::model::{Category, Cosmos, NodeDraft, UniverseRef};
use starvault_core::sync::{LoadOutcome, LoadSource, SyncEngine};
use starvault_core::traits::{Identity, RemoteDocument, RemoteStore};
use starvault_core::vault::MemoryVault;

#[derive(Default)]
struct SharedRemote {
    docs: Mutex<HashMap<String, RemoteDocument>>,
}

#[async_trait]
impl RemoteStore for SharedRemote {
    async fn upsert(&self, user_id: &str, doc: &RemoteDocument) -> Result<(), StarVaultError> {
        self.docs.lock().await.insert(user_id.to_string(), doc.clone());
        Ok(())
    }

    async fn fetch_authoritative(
        &self,
        user_id: &str,
    ) -> Result<Option<RemoteDocument>, StarVaultError> {
        Ok(self.docs.lock().await.get(user_id).cloned())
    }

    async fn delete(&self, user_id: &str) -> Result<(), StarVaultError> {
        self.docs.lock().await.remove(user_id);
        Ok(())
    }
}

struct User(&'static str);

impl Identity for User {
    fn current_user_id(&self) -> Option<String> {
        Some(self.0.to_string())
    }
}

fn expect_restored(outcome: LoadOutcome) -> (Cosmos, LoadSource) {
    match outcome {
        LoadOutcome::Restored { cosmos, source, .. } => (cosmos, source),
        LoadOutcome::Empty => panic!("expected a stored document"),
    }
}

#[tokio::test]
async fn test_nested_node_survives_restart() {
    let vault = Arc::new(MemoryVault::new());
    let key = Arc::new(derive_key("hunter2", DEFAULT_KEY_SALT).unwrap());

    let mut cosmos = Cosmos::new("A");
    let n1 = cosmos
        .add_node(&UniverseRef::Root, NodeDraft::new("n1", Category::Star).at(0.0, 0.0))
        .unwrap();
    let n2 = cosmos
        .add_node(&UniverseRef::Inner(n1.clone()), NodeDraft::new("n2", Category::Star))
        .unwrap();

    let engine = SyncEngine::builder(vault.clone(), key.clone()).build();
    engine.save(&cosmos).await.unwrap();
    drop(engine);

    let engine = SyncEngine::builder(vault, key).build();
    let (loaded, source) = expect_restored(engine.load().await.unwrap());

    assert_eq!(source, LoadSource::Local);
    assert_eq!(loaded.root().len(), 1);
    assert_eq!(loaded.root().node_ids()[0], n1);
    let inner = loaded.node(&n1).unwrap().inner();
    assert_eq!(inner.len(), 1);
    assert_eq!(inner.node_ids()[0], n2);
    assert_eq!(loaded, cosmos);
}

#[tokio::test]
async fn test_second_device_loads_from_remote() {
    let remote = Arc::new(SharedRemote::default());

    let laptop_key = Arc::new(derive_key("same password", DEFAULT_KEY_SALT).unwrap());
    let laptop = SyncEngine::builder(Arc::new(MemoryVault::new()), laptop_key)
        .remote(remote.clone(), Arc::new(User("alice")))
        .build();
    let mut cosmos = Cosmos::genesis("alice");
    let ids = cosmos.root().node_ids().to_vec();
    cosmos.add_wormhole(&ids[0], &ids[1]);
    laptop.save(&cosmos).await.unwrap();
    assert!(laptop.flush().await.unwrap());

    let phone_vault = Arc::new(MemoryVault::new());
    let phone_key = Arc::new(derive_key("same password", DEFAULT_KEY_SALT).unwrap());
    let phone = SyncEngine::builder(phone_vault.clone(), phone_key)
        .remote(remote.clone(), Arc::new(User("alice")))
        .build();

    let (loaded, source) = expect_restored(phone.load().await.unwrap());
    assert_eq!(source, LoadSource::Remote);
    assert_eq!(loaded, cosmos);

    let exported = capsule::export(phone_vault.as_ref()).await.unwrap();
    let imported = capsule::import(&exported, phone.key()).unwrap();
    assert_eq!(imported.restored.cosmos, cosmos);
}
