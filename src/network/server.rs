//! TCP Server
//!
//! Binds the listen address, accepts connections, and hands each one to
//! the dispatcher. The accept loop never blocks on a client: the listener
//! is non-blocking and all request I/O happens on the worker pool.

use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::Result;
use crate::handlers::Gateway;

use super::dispatch::Dispatcher;

/// TCP server for the gateway
pub struct Server {
    listener: TcpListener,
    dispatcher: Dispatcher,
    shutdown: Arc<AtomicBool>,
}

impl Server {
    /// Bind the listen address and spin up the worker pool. Called only
    /// after the schema cache has loaded.
    pub fn bind(config: &Config, gateway: Arc<Gateway>) -> Result<Self> {
        let listener = TcpListener::bind(&config.listen_addr)?;
        listener.set_nonblocking(true)?;
        let dispatcher = Dispatcher::new(gateway, config)?;
        Ok(Self {
            listener,
            dispatcher,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// The bound address (useful when the config asked for port 0).
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Flag that stops the accept loop when set.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Accept connections until shutdown (blocking).
    pub fn run(self) -> Result<()> {
        tracing::info!("listening on {}", self.local_addr()?);

        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                break;
            }
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    tracing::trace!("request received from {}", peer);
                    // The listener is non-blocking; the accepted stream
                    // must not inherit that.
                    if let Err(e) = stream.set_nonblocking(false) {
                        tracing::warn!("could not configure stream from {}: {}", peer, e);
                        continue;
                    }
                    self.dispatcher.dispatch(stream);
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    std::thread::sleep(Duration::from_millis(20));
                }
                Err(e) => {
                    tracing::warn!("accept failed: {}", e);
                }
            }
        }

        tracing::info!("shutting down, draining worker pool");
        self.dispatcher.shutdown();
        Ok(())
    }
}
