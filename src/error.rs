//! Error types for rowgate
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using GatewayError
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Unified error type for rowgate operations
#[derive(Debug, Error)]
pub enum GatewayError {
    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Request Validation Errors
    // -------------------------------------------------------------------------
    #[error("{0} argument required")]
    MissingParameter(&'static str),

    #[error("unknown resource: {0}")]
    UnknownResource(String),

    #[error("malformed entity: {0}")]
    MalformedEntity(String),

    #[error("value out of range: {0}")]
    ValueOutOfRange(String),

    // -------------------------------------------------------------------------
    // Backend Errors
    // -------------------------------------------------------------------------
    #[error("backend error: {0}")]
    Backend(String),

    // -------------------------------------------------------------------------
    // Client-side Errors
    // -------------------------------------------------------------------------
    /// Application-level failure reported by the gateway in a 500 body.
    /// Distinct from `Io`/`Protocol`, which mean no status line arrived.
    #[error("remote error: {0}")]
    Remote(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for GatewayError {
    fn from(e: serde_json::Error) -> Self {
        GatewayError::MalformedEntity(e.to_string())
    }
}
