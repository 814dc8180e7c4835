//! Network Module
//!
//! TCP listener and request execution.
//!
//! ## Architecture
//! - Single non-blocking acceptor loop
//! - Bounded worker pool running the full request lifecycle
//!   (Received → Queued → Executing → Responding → Closed)
//! - One request per connection, closed after the response

mod connection;
mod dispatch;
mod server;

pub use connection::Connection;
pub use dispatch::Dispatcher;
pub use server::Server;
