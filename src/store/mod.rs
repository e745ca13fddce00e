//! Store Module
//!
//! The external replicated graph store (treated as a black box with
//! get/put primitives) and the envelope adapter that layers TTL semantics
//! on top of it.

pub mod adapter;
pub mod envelope;
pub mod graph;
pub mod replication;

pub use adapter::EnvelopeStore;
pub use envelope::Envelope;
pub use graph::{GraphStore, MeshStore};

use thiserror::Error;

// == Store Error ==
/// Failures at the store layer.
///
/// A malformed envelope is a defect in the external store, never a client
/// input error; it surfaces as an internal failure, not an empty result.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The value at a key does not have envelope shape
    #[error("malformed envelope at {root}/{item}: {reason}")]
    MalformedEnvelope {
        root: String,
        item: String,
        reason: String,
    },

    /// Persistence I/O failure
    #[error("store i/o failure: {0}")]
    Io(#[from] std::io::Error),

    /// Persistence encoding failure
    #[error("store serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),
}

// == Result Type Alias ==
/// Convenience Result type for the store layer.
pub type Result<T> = std::result::Result<T, StoreError>;
