//! Protocol Module
//!
//! The gateway's wire protocol: one request per connection.
//!
//! ## Request
//! A single line, terminated by `\n` (or end of stream):
//! ```text
//! VERB?key=value&key=value
//! ```
//! Values are percent-encoded; structured parameters (column_path,
//! column_parent, predicate, range, mutation_map, keys) are JSON strings
//! inside their value slots.
//!
//! ## Response
//! A status line, `\r\n`, then the body:
//! ```text
//! 200 OK\r\n<json result>
//! 500 Internal Server Error\r\n<error message>
//! ```
//! The connection closes right after the body.

mod request;
mod response;

pub use request::{encode_query, parse_request, percent_decode, percent_encode, Params, Request};
pub use response::{parse_response, Response, Status};
