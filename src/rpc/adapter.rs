//! RPC Handler Adapter
//!
//! Adapts a table of {method name -> async domain handler} into the
//! protocol layer's calling convention. Per call the adapter parses the
//! request payload, invokes the handler with the shared context, and
//! emits exactly one response: the handler's return value on success, or
//! a typed protocol error (status from the error kind, metadata pairs
//! translated into response headers) on failure.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

use crate::error::{ErrorKind, Result, ServiceError};
use crate::store::EnvelopeStore;

// == Service Context ==
/// Shared dependencies handed to every domain handler.
///
/// Constructed once at startup; handlers receive it as an explicit second
/// argument rather than having dependencies merged into the request.
pub struct ServiceContext {
    /// Envelope view of the shared store handle
    pub store: EnvelopeStore,
    /// TTL in seconds assigned to writes that do not carry one
    pub default_ttl: u64,
}

pub type SharedContext = Arc<ServiceContext>;

// == Call Kind ==
/// How a method exchanges messages with its caller.
///
/// This service registers unary methods only; a streaming registration is
/// a programming-contract violation, not a per-request condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Unary,
    Streaming,
}

type HandlerFuture = Pin<Box<dyn Future<Output = Result<Value>> + Send>>;
type BoxedHandler = Box<dyn Fn(Value, SharedContext) -> HandlerFuture + Send + Sync>;

struct Method {
    kind: CallKind,
    handler: BoxedHandler,
}

// == Method Table ==
/// Mapping from method name to domain handler.
#[derive(Default)]
pub struct MethodTable {
    methods: HashMap<String, Method>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a method under a wire name.
    pub fn register<F, Fut>(mut self, name: &str, kind: CallKind, handler: F) -> Self
    where
        F: Fn(Value, SharedContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        let boxed: BoxedHandler = Box::new(move |request, ctx| Box::pin(handler(request, ctx)));
        self.methods.insert(
            name.to_string(),
            Method {
                kind,
                handler: boxed,
            },
        );
        self
    }

    /// Names of the registered methods, for startup logging.
    pub fn method_names(&self) -> Vec<&str> {
        self.methods.keys().map(String::as_str).collect()
    }

    /// Builds the protocol router dispatching `POST /rpc/:method`.
    pub fn into_router(self, ctx: SharedContext) -> Router {
        let state = RpcState {
            table: Arc::new(self),
            ctx,
        };

        Router::new()
            .route("/rpc/:method", post(dispatch_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}

#[derive(Clone)]
struct RpcState {
    table: Arc<MethodTable>,
    ctx: SharedContext,
}

// == Dispatch ==
/// Protocol-level call handler for every registered method.
async fn dispatch_handler(
    State(state): State<RpcState>,
    Path(method): Path<String>,
    body: Bytes,
) -> Response {
    let Some(entry) = state.table.methods.get(&method) else {
        debug!("Rejecting call to unknown method '{}'", method);
        let body = Json(json!({"error": format!("unknown method '{}'", method)}));
        return (StatusCode::NOT_FOUND, body).into_response();
    };

    // Invariant of registration, not a client-input rule.
    assert!(
        entry.kind == CallKind::Unary,
        "method '{}' must be registered as non-streaming",
        method
    );

    debug!("Calling non-streaming handler for method {}", method);

    // An empty body is a valid empty request (ping carries no payload).
    let request: Value = if body.is_empty() {
        json!({})
    } else {
        match serde_json::from_slice(&body) {
            Ok(value) => value,
            Err(err) => {
                return error_response(
                    &method,
                    ServiceError::bad_request(format!("request payload is not valid JSON: {}", err)),
                )
            }
        }
    };

    match (entry.handler)(request, Arc::clone(&state.ctx)).await {
        Ok(response) => {
            debug!("Handler for method {} returned successfully", method);
            Json(response).into_response()
        }
        Err(err) => error_response(&method, err),
    }
}

// == Error Translation ==
/// Turns a typed failure into the protocol error response.
///
/// Metadata pairs become response headers. A pair that cannot be carried
/// as a header indicates a bug in error construction; the response
/// degrades to a bare internal error and the defect is logged.
fn error_response(method: &str, err: ServiceError) -> Response {
    match err.kind {
        ErrorKind::BadRequest => {
            debug!("Handler for method {} failed with typed error: {}", method, err)
        }
        ErrorKind::Internal => error!("Handler for method {} failed: {}", method, err),
    }

    let mut response = (err.kind.status(), Json(json!({"error": err.message}))).into_response();

    for (key, value) in &err.metadata {
        match (
            HeaderName::try_from(key.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            (Ok(name), Ok(header_value)) => {
                debug!("Setting response metadata {} => {}", key, value);
                response.headers_mut().insert(name, header_value);
            }
            _ => {
                error!(
                    "Error metadata pair '{}'='{}' is not wire-safe; responding without metadata",
                    key, value
                );
                let body = Json(json!({"error": ErrorKind::Internal.to_string()}));
                return (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
            }
        }
    }

    response
}
