//! Configuration for rowgate
//!
//! Centralized configuration with sensible defaults.

use std::time::Duration;

/// Main configuration for a rowgate instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Backend Configuration
    // -------------------------------------------------------------------------
    /// Backend store RPC address (host:port)
    pub backend_addr: String,

    /// Backend connection timeout (milliseconds); 0 disables
    pub backend_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address for the gateway
    pub listen_addr: String,

    /// Worker pool size (maximum concurrent command executions)
    pub worker_threads: usize,

    /// Bound on queued requests awaiting a worker
    pub queue_depth: usize,

    /// Connection read timeout (milliseconds); 0 disables
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds); 0 disables
    pub write_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_addr: "127.0.0.1:9160".to_string(),
            backend_timeout_ms: 10_000,
            listen_addr: "0.0.0.0:10000".to_string(),
            worker_threads: 20,
            queue_depth: 64,
            read_timeout_ms: 5000,
            write_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Backend connect/read/write timeout; `None` when disabled with 0.
    pub fn backend_timeout(&self) -> Option<Duration> {
        if self.backend_timeout_ms > 0 {
            Some(Duration::from_millis(self.backend_timeout_ms))
        } else {
            None
        }
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the backend store address (host:port)
    pub fn backend_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.backend_addr = addr.into();
        self
    }

    /// Set the backend connection timeout (in milliseconds)
    pub fn backend_timeout_ms(mut self, ms: u64) -> Self {
        self.config.backend_timeout_ms = ms;
        self
    }

    /// Set the gateway listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the worker pool size
    pub fn worker_threads(mut self, count: usize) -> Self {
        self.config.worker_threads = count;
        self
    }

    /// Set the bound on queued requests
    pub fn queue_depth(mut self, depth: usize) -> Self {
        self.config.queue_depth = depth;
        self
    }

    /// Set the connection read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the connection write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
