//! Domain Handlers
//!
//! The recognized RPC methods. Each handler takes the request payload and
//! the shared context explicitly, validates path shape before anything
//! else, and returns a typed result the adapter translates onto the wire.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{Result, ServiceError};
use crate::key::derive_key;
use crate::models::{DeleteEntryRequest, GetEntryRequest, GetEntryResponse, SetEntryRequest};
use crate::rpc::adapter::{CallKind, MethodTable, SharedContext};

// == Method Table ==
/// Builds the service's method table with all recognized methods.
pub fn method_table() -> MethodTable {
    MethodTable::new()
        .register("ping", CallKind::Unary, ping)
        .register("getEntry", CallKind::Unary, get_entry)
        .register("setEntry", CallKind::Unary, set_entry)
        .register("deleteEntry", CallKind::Unary, delete_entry)
}

// == Helpers ==
/// Decodes a request payload; a shape mismatch is the caller's fault.
fn parse_request<T: DeserializeOwned>(request: Value) -> Result<T> {
    serde_json::from_value(request)
        .map_err(|err| ServiceError::bad_request(format!("malformed request payload: {}", err)))
}

/// Encodes a response DTO; failure here is a bug, not a client error.
fn to_response_value<T: Serialize>(response: T) -> Result<Value> {
    serde_json::to_value(response)
        .map_err(|err| ServiceError::internal(format!("failed to encode response: {}", err)))
}

// == Ping ==
/// Liveness probe; no side effects.
async fn ping(_request: Value, _ctx: SharedContext) -> Result<Value> {
    debug!("Received ping request");
    Ok(json!({}))
}

// == Get Entry ==
/// Reads the envelope at a path. An absent entry yields an empty result,
/// not an error.
async fn get_entry(request: Value, ctx: SharedContext) -> Result<Value> {
    let req: GetEntryRequest = parse_request(request)?;
    if let Some(msg) = req.validate() {
        debug!("Rejecting getEntry request: {}", msg);
        return Err(ServiceError::bad_request(msg));
    }
    debug!("Received getEntry request for path {:?}", req.path);

    let key = derive_key(&req.path);
    let response = match ctx.store.get(&key).await? {
        Some(envelope) => GetEntryResponse::from(envelope),
        None => GetEntryResponse::absent(),
    };
    to_response_value(response)
}

// == Set Entry ==
/// Creates or replaces the envelope at a path and schedules its expiry.
/// Writes without a TTL get the service default.
async fn set_entry(request: Value, ctx: SharedContext) -> Result<Value> {
    let req: SetEntryRequest = parse_request(request)?;
    if let Some(msg) = req.validate() {
        debug!("Rejecting setEntry request: {}", msg);
        return Err(ServiceError::bad_request(msg));
    }
    debug!("Received setEntry request for path {:?}", req.path);

    let key = derive_key(&req.path);
    let ttl = req.ttl.unwrap_or(ctx.default_ttl);
    ctx.store.put(&key, req.item, ttl).await?;
    Ok(json!({}))
}

// == Delete Entry ==
/// Tombstones the entry at a path. Idempotent; deleting a non-existent
/// entry is not an error.
async fn delete_entry(request: Value, ctx: SharedContext) -> Result<Value> {
    let req: DeleteEntryRequest = parse_request(request)?;
    if let Some(msg) = req.validate() {
        debug!("Rejecting deleteEntry request: {}", msg);
        return Err(ServiceError::bad_request(msg));
    }
    debug!("Received deleteEntry request for path {:?}", req.path);

    let key = derive_key(&req.path);
    ctx.store.delete(&key).await?;
    Ok(json!({}))
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::rpc::adapter::ServiceContext;
    use crate::store::{EnvelopeStore, MeshStore};
    use std::sync::Arc;

    fn test_context() -> SharedContext {
        Arc::new(ServiceContext {
            store: EnvelopeStore::new(MeshStore::open(&[], None).unwrap()),
            default_ttl: 60,
        })
    }

    #[tokio::test]
    async fn test_ping_returns_empty_object() {
        let response = ping(json!({}), test_context()).await.unwrap();
        assert_eq!(response, json!({}));
    }

    #[tokio::test]
    async fn test_set_then_get_roundtrip() {
        let ctx = test_context();

        let set = set_entry(
            json!({"path": ["users", "alice"], "item": "v", "ttl": 60}),
            Arc::clone(&ctx),
        )
        .await
        .unwrap();
        assert_eq!(set, json!({}));

        let get = get_entry(json!({"path": ["users", "alice"]}), ctx)
            .await
            .unwrap();
        assert_eq!(get["item"], "v");
        assert_eq!(get["ttl"], 60);
        assert!(get["stored"]["seconds"].as_u64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_get_absent_entry_is_empty_object() {
        let response = get_entry(json!({"path": ["nothing", "here"]}), test_context())
            .await
            .unwrap();
        assert_eq!(response, json!({}));
    }

    #[tokio::test]
    async fn test_set_without_ttl_uses_default() {
        let ctx = test_context();

        set_entry(json!({"path": ["d"], "item": "v"}), Arc::clone(&ctx))
            .await
            .unwrap();

        let get = get_entry(json!({"path": ["d"]}), ctx).await.unwrap();
        assert_eq!(get["ttl"], 60);
    }

    #[tokio::test]
    async fn test_empty_path_is_bad_request_before_store() {
        let ctx = test_context();

        for request in [
            get_entry(json!({"path": []}), Arc::clone(&ctx)).await,
            set_entry(json!({"path": [], "item": "v", "ttl": 1}), Arc::clone(&ctx)).await,
            delete_entry(json!({"path": []}), Arc::clone(&ctx)).await,
        ] {
            let err = request.unwrap_err();
            assert_eq!(err.kind, ErrorKind::BadRequest);
        }
    }

    #[tokio::test]
    async fn test_non_string_item_is_bad_request() {
        let err = set_entry(json!({"path": ["a"], "item": 19}), test_context())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::BadRequest);
    }

    #[tokio::test]
    async fn test_delete_twice_succeeds() {
        let ctx = test_context();
        let request = json!({"path": ["x"]});

        delete_entry(request.clone(), Arc::clone(&ctx)).await.unwrap();
        delete_entry(request, ctx).await.unwrap();
    }

    #[tokio::test]
    async fn test_deep_path_set_and_get() {
        let ctx = test_context();

        set_entry(
            json!({"path": ["events", "2024", "berlin"], "item": "talk", "ttl": 60}),
            Arc::clone(&ctx),
        )
        .await
        .unwrap();

        let get = get_entry(json!({"path": ["events", "2024", "berlin"]}), ctx)
            .await
            .unwrap();
        assert_eq!(get["item"], "talk");
    }
}
