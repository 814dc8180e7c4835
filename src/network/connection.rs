//! Connection Handler
//!
//! One request per connection: read the request line, execute, write the
//! status and body, close. Handler-level failures become `500` bodies and
//! never propagate past the connection.

use std::io::{BufRead, BufReader, BufWriter};
use std::net::TcpStream;
use std::time::Duration;

use crate::error::Result;
use crate::handlers::Gateway;
use crate::protocol::{parse_request, Response};

/// Handles a single client connection
pub struct Connection {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
    peer_addr: String,
}

impl Connection {
    pub fn new(stream: TcpStream) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;
        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
            peer_addr,
        })
    }

    /// Configure connection timeouts
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        if read_ms > 0 {
            self.reader
                .get_ref()
                .set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            self.writer
                .get_ref()
                .set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }
        Ok(())
    }

    /// Run the request lifecycle to completion. The connection closes on
    /// drop, whatever path gets us out of here.
    pub fn serve(mut self, gateway: &Gateway) -> Result<()> {
        let mut line = Vec::new();
        self.reader.read_until(b'\n', &mut line)?;
        if line.is_empty() {
            tracing::debug!("client {} closed before sending a request", self.peer_addr);
            return Ok(());
        }
        let line = String::from_utf8_lossy(&line);
        tracing::debug!("received data from {}: {}", self.peer_addr, line.trim_end());

        // Executing → Responding; a failed parse or handler error responds
        // with a 500 rather than dropping the connection silently.
        let response = match parse_request(&line) {
            Ok(request) => Response::from_outcome(gateway.execute(&request)),
            Err(e) => Response::error(&e.to_string()),
        };

        match &response.body {
            Some(body) => tracing::debug!(
                "returning {} to {}: {}",
                response.status.line(),
                self.peer_addr,
                body
            ),
            None => tracing::debug!("returning {} to {}", response.status.line(), self.peer_addr),
        }

        response.write_to(&mut self.writer)?;
        Ok(())
    }

    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}
