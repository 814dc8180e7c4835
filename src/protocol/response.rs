//! Response framing
//!
//! Status line plus body, written once and followed by connection close.

use std::io::Write;

use serde_json::Value;

use crate::error::{GatewayError, Result};

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Error,
}

impl Status {
    pub fn line(self) -> &'static str {
        match self {
            Status::Ok => "200 OK",
            Status::Error => "500 Internal Server Error",
        }
    }
}

/// A response to send to the client
#[derive(Debug, Clone)]
pub struct Response {
    pub status: Status,
    /// JSON result for success (absent when the call returns nothing),
    /// error message for failure.
    pub body: Option<String>,
}

impl Response {
    pub fn ok(body: Option<String>) -> Self {
        Self {
            status: Status::Ok,
            body,
        }
    }

    pub fn error(message: &str) -> Self {
        Self {
            status: Status::Error,
            body: Some(message.to_string()),
        }
    }

    /// Fold a handler outcome into a response. Handler-level errors become
    /// 500s with a descriptive body; they never escape further.
    pub fn from_outcome(outcome: Result<Option<Value>>) -> Self {
        match outcome {
            Ok(Some(value)) => Response::ok(Some(value.to_string())),
            Ok(None) => Response::ok(None),
            Err(e) => Response::error(&e.to_string()),
        }
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(self.status.line().as_bytes())?;
        writer.write_all(b"\r\n")?;
        if let Some(body) = &self.body {
            writer.write_all(body.as_bytes())?;
        }
        writer.flush()
    }
}

// =============================================================================
// Client-side Parsing
// =============================================================================

/// Interpret a complete raw response. A missing or unparsable status line
/// is a transport-class `Protocol` error, distinct from an application
/// `500`, which maps to `Remote` with the server's message.
pub fn parse_response(raw: &str) -> Result<Option<Value>> {
    let (status, body) = raw
        .split_once("\r\n")
        .ok_or_else(|| GatewayError::Protocol("connection closed without a status line".to_string()))?;

    if status.starts_with("200") {
        if body.is_empty() {
            Ok(None)
        } else {
            Ok(Some(serde_json::from_str(body)?))
        }
    } else if status.starts_with("500") {
        Err(GatewayError::Remote(body.to_string()))
    } else {
        Err(GatewayError::Protocol(format!(
            "could not parse valid status code from response: {:?}",
            status
        )))
    }
}
