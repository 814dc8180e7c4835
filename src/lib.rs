//! # rowgate
//!
//! A schema-aware TCP gateway for a column-oriented distributed store:
//! - one-line text-framed request/response protocol, JSON bodies
//! - schema-driven marshalling of typed column names (long / UUID / text)
//! - one backend RPC call per request over a dedicated connection
//! - bounded worker pool decoupling backend latency from acceptance
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       TCP Listener                           │
//! │               (one request per connection)                   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      Dispatcher                              │
//! │               (bounded worker pool)                          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   Command Handlers                           │
//! └───────┬──────────────────┬──────────────────┬───────────────┘
//!         │                  │                  │
//!         ▼                  ▼                  ▼
//!  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//!  │Schema Cache │    │ Marshalling │    │  Store RPC  │
//!  │ (immutable) │    │   Engine    │    │  (Thrift)   │
//!  └─────────────┘    └─────────────┘    └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod model;
pub mod schema;
pub mod marshal;
pub mod backend;
pub mod handlers;
pub mod protocol;
pub mod network;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use client::GatewayClient;
pub use config::Config;
pub use error::{GatewayError, Result};
pub use handlers::Gateway;
pub use network::Server;
pub use schema::SchemaCache;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of rowgate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
