//! TTL Expiry Task
//!
//! Deferred tombstone write scheduled by every envelope put. The task is
//! bound to the write generation that created it: before tombstoning it
//! re-reads the key and no-ops unless the envelope still carries the
//! `stored`/`ttl` pair it was scheduled with. A later put to the same key
//! therefore survives an earlier put's timer.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::key::StorageKey;
use crate::store::adapter::issue_tombstone;
use crate::store::{Envelope, GraphStore};

/// Spawns the deferred tombstone task for one write.
///
/// Sleeps for `ttl` seconds measured from the write, then tombstones the
/// key if and only if the envelope found there is the same generation
/// (`stored` and `ttl` both match). The task is fire-and-forget; the
/// writer never awaits its outcome.
///
/// # Arguments
/// * `store` - Shared store handle
/// * `key` - Storage key the envelope was written at
/// * `stored` - The write's creation timestamp (ms since epoch)
/// * `ttl` - The write's time-to-live in seconds
pub fn spawn_expiry_task(
    store: Arc<dyn GraphStore>,
    key: StorageKey,
    stored: u64,
    ttl: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(ttl)).await;

        let current = match store.read(&key.root, &key.item).await {
            Ok(value) => value,
            Err(err) => {
                warn!(
                    "Expiry read for {}/{} failed, leaving entry in place: {}",
                    key.root, key.item, err
                );
                return;
            }
        };

        let Some(value) = current else {
            debug!("Entry {}/{} already gone at expiry", key.root, key.item);
            return;
        };

        match Envelope::from_value(&value, &key.root, &key.item) {
            Ok(envelope) if envelope.stored == stored && envelope.ttl == ttl => {
                debug!("Expiring entry {}/{} after {}s", key.root, key.item, ttl);
                issue_tombstone(store, key).await;
            }
            Ok(_) => {
                debug!(
                    "Entry {}/{} was overwritten, expiry timer stands down",
                    key.root, key.item
                );
            }
            Err(err) => {
                warn!("Malformed envelope at expiry for {}/{}: {}", key.root, key.item, err);
            }
        }
    })
}
