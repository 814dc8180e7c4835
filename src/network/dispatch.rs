//! Dispatcher
//!
//! A bounded worker pool decoupling slow backend calls from connection
//! acceptance. Accepted connections are queued onto a crossbeam channel;
//! each worker runs one request's full lifecycle at a time. A full queue
//! back-pressures the acceptor. Once dispatched, a request runs to
//! completion or failure; there is no cancellation and no retry.

use std::net::TcpStream;
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam::channel::{self, Sender};

use crate::config::Config;
use crate::error::{GatewayError, Result};
use crate::handlers::Gateway;

use super::connection::Connection;

pub struct Dispatcher {
    sender: Option<Sender<TcpStream>>,
    workers: Vec<JoinHandle<()>>,
}

impl Dispatcher {
    pub fn new(gateway: Arc<Gateway>, config: &Config) -> Result<Self> {
        let (sender, receiver) = channel::bounded::<TcpStream>(config.queue_depth);

        let mut workers = Vec::with_capacity(config.worker_threads);
        for id in 0..config.worker_threads {
            let receiver = receiver.clone();
            let gateway = Arc::clone(&gateway);
            let read_ms = config.read_timeout_ms;
            let write_ms = config.write_timeout_ms;

            let handle = std::thread::Builder::new()
                .name(format!("rowgate-worker-{}", id))
                .spawn(move || {
                    for stream in receiver {
                        serve_stream(stream, &gateway, read_ms, write_ms);
                    }
                })
                .map_err(|e| {
                    GatewayError::Config(format!("could not spawn worker thread: {}", e))
                })?;
            workers.push(handle);
        }

        Ok(Self {
            sender: Some(sender),
            workers,
        })
    }

    /// Queue an accepted connection for execution. Blocks when the queue
    /// is full.
    pub fn dispatch(&self, stream: TcpStream) {
        tracing::trace!("request queued");
        if let Some(sender) = &self.sender {
            // Send fails only after shutdown has dropped the receivers.
            let _ = sender.send(stream);
        }
    }

    /// Stop accepting work and wait for in-flight requests to finish.
    pub fn shutdown(mut self) {
        self.sender.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

fn serve_stream(stream: TcpStream, gateway: &Gateway, read_ms: u64, write_ms: u64) {
    tracing::trace!("request executing");
    let connection = match Connection::new(stream) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("could not set up connection: {}", e);
            return;
        }
    };
    serve_connection(connection, gateway, read_ms, write_ms);
}

fn serve_connection(mut connection: Connection, gateway: &Gateway, read_ms: u64, write_ms: u64) {
    if let Err(e) = connection.set_timeouts(read_ms, write_ms) {
        tracing::warn!(
            "could not set timeouts for {}: {}",
            connection.peer_addr(),
            e
        );
        return;
    }
    let peer = connection.peer_addr().to_string();
    if let Err(e) = connection.serve(gateway) {
        // Transport failures are local to this connection.
        tracing::warn!("connection error for {}: {}", peer, e);
    }
    tracing::trace!("request closed");
}
