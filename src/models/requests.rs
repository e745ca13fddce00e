//! Request DTOs for the RPC surface
//!
//! Defines the structure of incoming RPC request payloads. Path
//! validation lives here and runs at the top of every domain handler,
//! before anything touches the store layer.

use serde::Deserialize;

/// Validates path shape: non-empty, with non-empty segments.
///
/// Returns an error message if validation fails, None if valid.
fn validate_path(path: &[String]) -> Option<String> {
    if path.is_empty() {
        return Some("path should be a non-empty array".to_string());
    }
    if path.iter().any(String::is_empty) {
        return Some("path segments must be non-empty strings".to_string());
    }
    None
}

/// Request payload for the getEntry method
#[derive(Debug, Clone, Deserialize)]
pub struct GetEntryRequest {
    /// Hierarchical path identifying the cache entry
    pub path: Vec<String>,
}

impl GetEntryRequest {
    pub fn validate(&self) -> Option<String> {
        validate_path(&self.path)
    }
}

/// Request payload for the setEntry method
///
/// # Fields
/// - `path`: The cache location to store under
/// - `item`: The string payload to store
/// - `ttl`: Optional TTL in seconds (uses the service default if absent)
#[derive(Debug, Clone, Deserialize)]
pub struct SetEntryRequest {
    pub path: Vec<String>,
    pub item: String,
    #[serde(default)]
    pub ttl: Option<u64>,
}

impl SetEntryRequest {
    pub fn validate(&self) -> Option<String> {
        validate_path(&self.path)
    }
}

/// Request payload for the deleteEntry method
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteEntryRequest {
    pub path: Vec<String>,
}

impl DeleteEntryRequest {
    pub fn validate(&self) -> Option<String> {
        validate_path(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_request_deserialize() {
        let json = r#"{"path": ["users", "alice"], "item": "hello"}"#;
        let req: SetEntryRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.path, vec!["users", "alice"]);
        assert_eq!(req.item, "hello");
        assert!(req.ttl.is_none());
    }

    #[test]
    fn test_set_request_with_ttl() {
        let json = r#"{"path": ["users"], "item": "hello", "ttl": 60}"#;
        let req: SetEntryRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.ttl, Some(60));
    }

    #[test]
    fn test_set_request_rejects_non_string_item() {
        let json = r#"{"path": ["users"], "item": 42}"#;
        assert!(serde_json::from_str::<SetEntryRequest>(json).is_err());
    }

    #[test]
    fn test_validate_empty_path() {
        let req = GetEntryRequest { path: vec![] };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_validate_empty_segment() {
        let req = DeleteEntryRequest {
            path: vec!["users".to_string(), "".to_string()],
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_validate_valid_path() {
        let req = GetEntryRequest {
            path: vec!["users".to_string(), "alice".to_string()],
        };
        assert!(req.validate().is_none());
    }
}
