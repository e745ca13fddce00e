//! RPC Module
//!
//! The non-streaming RPC surface of the facade.
//!
//! # Methods
//! - `ping` - Liveness probe, no side effects
//! - `getEntry` - Read the envelope at a path
//! - `setEntry` - Create/replace an envelope and schedule its expiry
//! - `deleteEntry` - Tombstone a path, idempotent

pub mod adapter;
pub mod handlers;

pub use adapter::{CallKind, MethodTable, ServiceContext, SharedContext};
pub use handlers::method_table;
