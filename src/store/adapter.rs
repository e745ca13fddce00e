//! Envelope Store Adapter
//!
//! Layers envelope semantics (payload, stored-at, TTL) over the graph
//! store's raw get/put primitives and schedules the deferred tombstone
//! that implements expiry.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::key::StorageKey;
use crate::store::{Envelope, GraphStore, Result};
use crate::tasks::spawn_expiry_task;

/// How long a tombstone write may wait for the store's acknowledgment.
///
/// At least one external-store implementation does not reliably invoke
/// the completion callback for null writes; the adapter issues the write
/// and resolves once this window closes, letting the write finish in the
/// background.
const TOMBSTONE_ACK_TIMEOUT: Duration = Duration::from_millis(250);

// == Envelope Store ==
/// Envelope-level view of the shared graph store.
///
/// Cloning is cheap; all clones point at the same store handle.
#[derive(Clone)]
pub struct EnvelopeStore {
    store: Arc<dyn GraphStore>,
}

impl EnvelopeStore {
    // == Constructor ==
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    // == Get ==
    /// Reads the envelope at a key, if any.
    ///
    /// Issues exactly one read and takes the store's first value
    /// notification. A null or missing value means no entry; any other
    /// shape must decode as an envelope or the read fails as a store
    /// defect.
    pub async fn get(&self, key: &StorageKey) -> Result<Option<Envelope>> {
        match self.store.read(&key.root, &key.item).await? {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Envelope::from_value(&value, &key.root, &key.item).map(Some),
        }
    }

    // == Put ==
    /// Writes an envelope stamped with the current time and schedules its
    /// expiry.
    ///
    /// Returns once the store acknowledges the write; the deferred
    /// tombstone is fire-and-forget and bound to this write's generation,
    /// so it cannot delete a later write to the same key.
    pub async fn put(&self, key: &StorageKey, item: String, ttl: u64) -> Result<Envelope> {
        let envelope = Envelope::new(item, ttl);
        debug!(
            "Storing envelope at {}/{} (stored={}, ttl={}s)",
            key.root, key.item, envelope.stored, envelope.ttl
        );

        self.store
            .write(&key.root, &key.item, Some(envelope.to_value()))
            .await?;

        spawn_expiry_task(
            Arc::clone(&self.store),
            key.clone(),
            envelope.stored,
            envelope.ttl,
        );

        Ok(envelope)
    }

    // == Delete ==
    /// Writes a tombstone at a key.
    ///
    /// Idempotent; deleting an absent key is not an error. Never blocks
    /// past the acknowledgment window.
    pub async fn delete(&self, key: &StorageKey) -> Result<()> {
        debug!("Tombstoning entry at {}/{}", key.root, key.item);
        issue_tombstone(Arc::clone(&self.store), key.clone()).await;
        Ok(())
    }
}

// == Issue Tombstone ==
/// Issues a tombstone write with a bounded wait for the store ack.
///
/// The write runs on its own task so it completes even when the caller
/// stops waiting.
pub(crate) async fn issue_tombstone(store: Arc<dyn GraphStore>, key: StorageKey) {
    let write = tokio::spawn(async move { store.write(&key.root, &key.item, None).await });

    match timeout(TOMBSTONE_ACK_TIMEOUT, write).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(err))) => warn!("Tombstone write failed: {}", err),
        Ok(Err(join_err)) => warn!("Tombstone write task failed: {}", join_err),
        Err(_) => debug!("Store did not acknowledge tombstone write in time, proceeding"),
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MeshStore, StoreError};
    use serde_json::json;

    fn key(root: &str, item: &str) -> StorageKey {
        StorageKey {
            root: root.to_string(),
            item: item.to_string(),
        }
    }

    fn envelope_store() -> EnvelopeStore {
        EnvelopeStore::new(MeshStore::open(&[], None).unwrap())
    }

    #[tokio::test]
    async fn test_get_absent_key() {
        let store = envelope_store();
        assert!(store.get(&key("users", "alice")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_then_get_roundtrip() {
        let store = envelope_store();
        let written = store
            .put(&key("users", "alice"), "hello".to_string(), 60)
            .await
            .unwrap();

        let read = store.get(&key("users", "alice")).await.unwrap().unwrap();
        assert_eq!(read, written);
        assert_eq!(read.item, "hello");
        assert_eq!(read.ttl, 60);
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let store = envelope_store();
        store
            .put(&key("a", "b"), "short lived".to_string(), 1)
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(1300)).await;

        assert!(store.get(&key("a", "b")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_overwrite_survives_earlier_timer() {
        let store = envelope_store();
        let k = key("a", "b");

        store.put(&k, "first".to_string(), 1).await.unwrap();
        // Distinct stored timestamp for the second generation.
        tokio::time::sleep(Duration::from_millis(50)).await;
        store.put(&k, "second".to_string(), 60).await.unwrap();

        // Let the first write's timer fire.
        tokio::time::sleep(Duration::from_millis(1300)).await;

        let survivor = store.get(&k).await.unwrap().unwrap();
        assert_eq!(survivor.item, "second");
        assert_eq!(survivor.ttl, 60);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = envelope_store();
        let k = key("x", "");

        // Deleting a key that never existed succeeds, twice.
        store.delete(&k).await.unwrap();
        store.delete(&k).await.unwrap();

        store.put(&k, "v".to_string(), 60).await.unwrap();
        store.delete(&k).await.unwrap();
        assert!(store.get(&k).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_envelope_is_a_defect() {
        let graph = MeshStore::open(&[], None).unwrap();
        graph
            .write("a", "b", Some(json!({"item": 13, "stored": "soon", "ttl": 60})))
            .await
            .unwrap();

        let store = EnvelopeStore::new(graph);
        let result = store.get(&key("a", "b")).await;
        assert!(matches!(
            result,
            Err(StoreError::MalformedEnvelope { .. })
        ));
    }

    #[tokio::test]
    async fn test_explicit_null_reads_as_absent() {
        let graph = MeshStore::open(&[], None).unwrap();
        graph.write("a", "b", Some(Value::Null)).await.unwrap();

        let store = EnvelopeStore::new(graph);
        assert!(store.get(&key("a", "b")).await.unwrap().is_none());
    }
}
