//! Background Tasks Module
//!
//! Deferred work spawned during request handling.
//!
//! # Tasks
//! - Expiry: writes a tombstone at a key once its envelope's TTL elapses

mod expiry;

pub use expiry::spawn_expiry_task;
