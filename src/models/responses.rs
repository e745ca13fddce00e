//! Response DTOs for the RPC surface
//!
//! Defines the structure of outgoing RPC response payloads. setEntry,
//! deleteEntry and ping return empty objects and need no DTO.

use serde::Serialize;

use crate::store::Envelope;

/// Creation time of an entry, in whole seconds since epoch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredAt {
    pub seconds: u64,
}

/// Response payload for the getEntry method
///
/// An absent entry serializes as an empty object; presence of `item`
/// means the entry exists.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GetEntryResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stored: Option<StoredAt>,
}

impl GetEntryResponse {
    /// Empty response: no entry at the requested path.
    pub fn absent() -> Self {
        Self::default()
    }
}

impl From<Envelope> for GetEntryResponse {
    fn from(envelope: Envelope) -> Self {
        Self {
            stored: Some(StoredAt {
                seconds: envelope.stored_seconds(),
            }),
            ttl: Some(envelope.ttl),
            item: Some(envelope.item),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_serializes_to_empty_object() {
        let json = serde_json::to_value(GetEntryResponse::absent()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn test_from_envelope() {
        let envelope = Envelope {
            item: "v".to_string(),
            stored: 1_700_000_000_250,
            ttl: 60,
        };
        let response = GetEntryResponse::from(envelope);
        assert_eq!(response.item.as_deref(), Some("v"));
        assert_eq!(response.ttl, Some(60));
        assert_eq!(response.stored, Some(StoredAt { seconds: 1_700_000_000 }));
    }

    #[test]
    fn test_present_serialization_shape() {
        let envelope = Envelope {
            item: "v".to_string(),
            stored: 2_000,
            ttl: 30,
        };
        let json = serde_json::to_value(GetEntryResponse::from(envelope)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"item": "v", "ttl": 30, "stored": {"seconds": 2}})
        );
    }
}
