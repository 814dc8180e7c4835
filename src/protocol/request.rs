//! Request line parsing
//!
//! `VERB?query-string`, standard key=value&key=value encoding with percent
//! escapes and `+` for space.

use std::collections::BTreeMap;

use crate::error::{GatewayError, Result};

/// Decoded query-string parameters. Last occurrence of a repeated key wins.
#[derive(Debug, Clone, Default)]
pub struct Params {
    values: BTreeMap<String, String>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw query string.
    pub fn from_query(query: &str) -> Result<Self> {
        let mut values = BTreeMap::new();
        for pair in query.split('&') {
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            values.insert(percent_decode(key)?, percent_decode(value)?);
        }
        Ok(Self { values })
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Fetch a required parameter; absent or empty means the request is
    /// incomplete.
    pub fn required(&self, name: &'static str) -> Result<&str> {
        match self.get(name) {
            Some(v) if !v.is_empty() => Ok(v),
            _ => Err(GatewayError::MissingParameter(name)),
        }
    }
}

/// A parsed request line.
#[derive(Debug, Clone)]
pub struct Request {
    pub verb: String,
    pub params: Params,
}

pub fn parse_request(line: &str) -> Result<Request> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (verb, query) = line.split_once('?').unwrap_or((line, ""));
    let verb = verb.trim();
    if verb.is_empty() {
        return Err(GatewayError::Protocol("empty request line".to_string()));
    }
    Ok(Request {
        verb: verb.to_string(),
        params: Params::from_query(query)?,
    })
}

// =============================================================================
// Percent Encoding
// =============================================================================

pub fn percent_decode(input: &str) -> Result<String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hex = bytes.get(i + 1..i + 3).ok_or_else(|| {
                    GatewayError::Protocol("truncated percent escape".to_string())
                })?;
                let hex = std::str::from_utf8(hex)
                    .ok()
                    .and_then(|h| u8::from_str_radix(h, 16).ok())
                    .ok_or_else(|| {
                        GatewayError::Protocol(format!("bad percent escape in {:?}", input))
                    })?;
                out.push(hex);
                i += 3;
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    Ok(String::from_utf8_lossy(&out).into_owned())
}

pub fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for &b in input.as_bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

/// Build a query string from key/value pairs, escaping the values.
pub fn encode_query<'a>(pairs: impl IntoIterator<Item = (&'a str, String)>) -> String {
    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, percent_encode(&v)))
        .collect::<Vec<_>>()
        .join("&")
}
