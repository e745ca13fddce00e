//! Graph Store Module
//!
//! The replicated key/value graph store the facade caches in front of.
//! The store is addressed as root nodes with item keys below them; values
//! are loosely-typed JSON nodes, and a null value is a tombstone.
//!
//! Replication and conflict resolution belong to the store, not to the
//! facade: peers exchange updates over the replication listener and
//! conflicts resolve last-write-wins on the update timestamp.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info};

use crate::store::envelope::current_timestamp_ms;
use crate::store::replication::{spawn_peer_link, ReplicationUpdate};
use crate::store::Result;

// == Graph Store Trait ==
/// Async get/put seam over the external store.
///
/// `read` returns the first value notification for a key and nothing
/// more; callers never hold a live subscription. `write` resolves once
/// the store has acknowledged the value locally; propagation to peers is
/// the store's own concern.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Reads the current value at a key. `None` means absent or tombstoned.
    async fn read(&self, root: &str, item: &str) -> Result<Option<Value>>;

    /// Writes a value at a key. `None` writes a tombstone.
    async fn write(&self, root: &str, item: &str, value: Option<Value>) -> Result<()>;
}

// == Versioned Value ==
/// A graph node plus the timestamp its last write carried.
///
/// Tombstones keep their timestamp so a stale replicated update cannot
/// resurrect a deleted key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionedValue {
    pub value: Option<Value>,
    pub updated_at: u64,
}

type Graph = HashMap<String, HashMap<String, VersionedValue>>;

// == Mesh Store ==
/// In-process implementation of the replicated graph store.
///
/// Holds the graph in memory, persists it as JSON to a local file, and
/// pushes every local write to the configured peers. Remote updates are
/// applied last-write-wins and never re-broadcast.
pub struct MeshStore {
    graph: RwLock<Graph>,
    db_file: Option<PathBuf>,
    peer_links: Vec<mpsc::Sender<ReplicationUpdate>>,
}

impl MeshStore {
    // == Open ==
    /// Opens the store: loads persisted state (if any) and connects the
    /// outbound peer links.
    ///
    /// # Arguments
    /// * `peers` - Peer endpoint URLs (`tcp://host:port`)
    /// * `db_file` - Local persistence target; `None` keeps the store
    ///   memory-only (used by tests)
    pub fn open(peers: &[String], db_file: Option<PathBuf>) -> Result<Arc<Self>> {
        let graph = match &db_file {
            Some(path) if path.exists() => {
                let bytes = std::fs::read(path)?;
                let graph: Graph = serde_json::from_slice(&bytes)?;
                info!("Loaded {} root nodes from {}", graph.len(), path.display());
                graph
            }
            _ => Graph::new(),
        };

        let peer_links = peers.iter().map(|url| spawn_peer_link(url.clone())).collect();

        Ok(Arc::new(Self {
            graph: RwLock::new(graph),
            db_file,
            peer_links,
        }))
    }

    // == Apply Remote ==
    /// Applies an update received from a peer.
    ///
    /// Last-write-wins: the update is dropped if the local node carries a
    /// newer timestamp. Remote updates are not re-broadcast.
    pub async fn apply_remote(&self, update: ReplicationUpdate) -> Result<()> {
        let applied = {
            let mut graph = self.graph.write().await;
            let items = graph.entry(update.root.clone()).or_default();
            match items.get(&update.item) {
                Some(existing) if existing.updated_at > update.updated_at => {
                    debug!(
                        "Dropping stale peer update for {}/{}",
                        update.root, update.item
                    );
                    false
                }
                _ => {
                    items.insert(
                        update.item.clone(),
                        VersionedValue {
                            value: update.value.clone(),
                            updated_at: update.updated_at,
                        },
                    );
                    true
                }
            }
        };

        if applied {
            self.persist().await?;
        }
        Ok(())
    }

    /// Snapshots the graph and writes it to the persistence target.
    async fn persist(&self) -> Result<()> {
        let Some(path) = &self.db_file else {
            return Ok(());
        };
        let snapshot = {
            let graph = self.graph.read().await;
            serde_json::to_vec(&*graph)?
        };
        tokio::fs::write(path, snapshot).await?;
        Ok(())
    }

    /// Pushes a local update to every peer link, fire-and-forget.
    fn broadcast(&self, update: &ReplicationUpdate) {
        for link in &self.peer_links {
            // A saturated or dead link drops the update; peers reconverge
            // on their next write (idempotent peer handling, LWW apply).
            let _ = link.try_send(update.clone());
        }
    }
}

#[async_trait]
impl GraphStore for MeshStore {
    async fn read(&self, root: &str, item: &str) -> Result<Option<Value>> {
        let graph = self.graph.read().await;
        Ok(graph
            .get(root)
            .and_then(|items| items.get(item))
            .and_then(|versioned| versioned.value.clone()))
    }

    async fn write(&self, root: &str, item: &str, value: Option<Value>) -> Result<()> {
        let update = ReplicationUpdate {
            root: root.to_string(),
            item: item.to_string(),
            value,
            updated_at: current_timestamp_ms(),
        };

        {
            let mut graph = self.graph.write().await;
            graph.entry(update.root.clone()).or_default().insert(
                update.item.clone(),
                VersionedValue {
                    value: update.value.clone(),
                    updated_at: update.updated_at,
                },
            );
        }

        self.persist().await?;
        self.broadcast(&update);
        Ok(())
    }
}
