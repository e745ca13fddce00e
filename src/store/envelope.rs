//! Envelope Module
//!
//! The unit actually stored in the graph store: a string payload plus the
//! timestamps that drive TTL expiry.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::StoreError;

// == Envelope ==
/// Stored record wrapping a cached value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// The cached payload
    pub item: String,
    /// Creation timestamp, milliseconds since epoch
    pub stored: u64,
    /// Time-to-live in seconds, measured from `stored`
    pub ttl: u64,
}

impl Envelope {
    // == Constructor ==
    /// Creates an envelope stamped with the current time.
    pub fn new(item: String, ttl: u64) -> Self {
        Self {
            item,
            stored: current_timestamp_ms(),
            ttl,
        }
    }

    // == From Value ==
    /// Validates and decodes a raw store value into an envelope.
    ///
    /// The store hands back loosely-typed graph nodes; `item` must be a
    /// string and `stored`/`ttl` must be numbers. Anything else is a
    /// defect in the external store and surfaces as an error.
    pub fn from_value(value: &Value, root: &str, item_key: &str) -> Result<Self, StoreError> {
        serde_json::from_value(value.clone()).map_err(|err| StoreError::MalformedEnvelope {
            root: root.to_string(),
            item: item_key.to_string(),
            reason: err.to_string(),
        })
    }

    // == To Value ==
    /// Encodes the envelope as a raw store value.
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "item": self.item,
            "stored": self.stored,
            "ttl": self.ttl,
        })
    }

    /// Creation time expressed in whole seconds since epoch.
    pub fn stored_seconds(&self) -> u64 {
        self.stored / 1000
    }
}

// == Utility Functions ==
/// Returns the current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}
