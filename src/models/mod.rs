//! Request and Response models for the RPC surface
//!
//! DTOs (Data Transfer Objects) used for serializing/deserializing RPC
//! request and response payloads.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{DeleteEntryRequest, GetEntryRequest, SetEntryRequest};
pub use responses::{GetEntryResponse, StoredAt};
