//! Error types for the caching facade
//!
//! Domain handlers return typed failures; the RPC adapter pattern-matches
//! on the kind to pick the protocol status and to translate metadata.

use std::collections::BTreeMap;
use std::fmt;

use axum::http::StatusCode;
use thiserror::Error;

use crate::store::StoreError;

// == Error Kind ==
/// Failure taxonomy crossing the RPC boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid argument from the caller (empty/malformed path, wrong-typed value)
    BadRequest,
    /// Any failure that is not the caller's fault, including store defects
    Internal,
}

impl ErrorKind {
    /// Protocol status code this kind maps to.
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::BadRequest => write!(f, "Bad Request"),
            ErrorKind::Internal => write!(f, "Implementation Error"),
        }
    }
}

// == Service Error ==
/// Typed failure produced by a domain handler.
///
/// Carries an optional string-keyed, string-valued metadata map which the
/// RPC adapter translates into protocol-level response metadata.
#[derive(Error, Debug)]
#[error("{kind}: {message}")]
pub struct ServiceError {
    pub kind: ErrorKind,
    pub message: String,
    pub metadata: BTreeMap<String, String>,
}

impl ServiceError {
    /// Creates a bad-request error (caller's fault, no metadata).
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::BadRequest,
            message: message.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Creates an internal error (never the caller's fault).
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Internal,
            message: message.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Attaches one metadata pair.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

// Store failures bubble unchanged through the domain handlers and surface
// as internal errors; the adapter logs the full detail server-side.
impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        ServiceError::internal(err.to_string())
    }
}

// == Result Type Alias ==
/// Convenience Result type for domain handlers.
pub type Result<T> = std::result::Result<T, ServiceError>;
