//! Mesh Cache - A caching facade over a replicated key/value graph store
//!
//! Stores string values under hierarchical paths with TTL-based expiry,
//! exposed over a non-streaming RPC surface. Replication peers are
//! discovered once at startup and handed to the store.

pub mod config;
pub mod discovery;
pub mod error;
pub mod key;
pub mod models;
pub mod rpc;
pub mod store;
pub mod tasks;
pub mod tls;

pub use config::Config;
pub use error::{ErrorKind, ServiceError};
pub use key::{derive_key, StorageKey};
pub use rpc::{method_table, MethodTable, ServiceContext};
pub use store::{Envelope, EnvelopeStore, GraphStore, MeshStore};
