//! Replication Module
//!
//! Store-to-store update plumbing: a line-delimited JSON protocol over
//! plain TCP on the well-known replication port. Outbound links push
//! local writes to peers with lazy reconnect; the inbound listener
//! applies peer updates last-write-wins.
//!
//! This traffic is unauthenticated and stays on the local network; only
//! the RPC channel carries TLS.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::store::graph::MeshStore;

/// Well-known port every node's replication listener binds.
pub const REPLICATION_PORT: u16 = 8765;

/// Outbound link queue depth before updates are dropped.
const LINK_QUEUE_DEPTH: usize = 64;

// == Replication Update ==
/// One key's new state, as exchanged between peers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicationUpdate {
    pub root: String,
    pub item: String,
    /// `None` replicates a tombstone
    pub value: Option<Value>,
    /// Write timestamp, milliseconds since epoch; drives last-write-wins
    pub updated_at: u64,
}

// == Peer Link ==
/// Spawns the outbound link task for one peer.
///
/// The returned sender accepts updates fire-and-forget; the task connects
/// lazily and reconnects on the next update after a failure. A dead peer
/// costs dropped updates, never a blocked writer.
pub fn spawn_peer_link(url: String) -> mpsc::Sender<ReplicationUpdate> {
    let (tx, mut rx) = mpsc::channel::<ReplicationUpdate>(LINK_QUEUE_DEPTH);

    tokio::spawn(async move {
        let target = peer_socket_target(&url);
        let mut stream: Option<TcpStream> = None;

        while let Some(update) = rx.recv().await {
            if stream.is_none() {
                match TcpStream::connect(&target).await {
                    Ok(connected) => {
                        debug!("Connected replication link to {}", url);
                        stream = Some(connected);
                    }
                    Err(err) => {
                        debug!("Replication link to {} unavailable: {}", url, err);
                        continue;
                    }
                }
            }

            let mut frame = match serde_json::to_vec(&update) {
                Ok(frame) => frame,
                Err(err) => {
                    warn!("Failed to encode replication update: {}", err);
                    continue;
                }
            };
            frame.push(b'\n');

            if let Some(connected) = stream.as_mut() {
                if let Err(err) = connected.write_all(&frame).await {
                    debug!("Replication link to {} broke: {}", url, err);
                    stream = None;
                }
            }
        }
    });

    tx
}

/// Strips the URL scheme down to a `host:port` connect target.
pub fn peer_socket_target(url: &str) -> String {
    match url.split_once("://") {
        Some((_scheme, rest)) => rest.to_string(),
        None => url.to_string(),
    }
}

// == Replication Listener ==
/// Accept loop for inbound peer connections.
///
/// Runs for the process lifetime; each peer connection gets its own task.
pub async fn serve_replication(store: Arc<MeshStore>, listener: TcpListener) {
    loop {
        match listener.accept().await {
            Ok((stream, peer_addr)) => {
                debug!("Replication peer connected from {}", peer_addr);
                let store = Arc::clone(&store);
                tokio::spawn(handle_peer(store, stream));
            }
            Err(err) => {
                warn!("Failed to accept replication connection: {}", err);
            }
        }
    }
}

/// Reads updates from one peer connection until it closes.
async fn handle_peer(store: Arc<MeshStore>, stream: TcpStream) {
    let mut lines = BufReader::new(stream).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match serde_json::from_str::<ReplicationUpdate>(&line) {
                Ok(update) => {
                    if let Err(err) = store.apply_remote(update).await {
                        warn!("Failed to apply peer update: {}", err);
                    }
                }
                Err(err) => {
                    debug!("Ignoring malformed replication frame: {}", err);
                }
            },
            Ok(None) => break,
            Err(err) => {
                debug!("Replication connection dropped: {}", err);
                break;
            }
        }
    }
}
