//! rowgate Server Binary
//!
//! Loads the schema cache from the backend, then starts the gateway
//! listener. Startup fails fatally if the backend is unreachable.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use rowgate::backend::ThriftConnector;
use rowgate::{Config, Gateway, SchemaCache, Server};

/// rowgate Server
#[derive(Parser, Debug)]
#[command(name = "rowgate-server")]
#[command(about = "Schema-aware gateway for a column-oriented store")]
#[command(version)]
struct Args {
    /// Backend store host
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Backend store port
    #[arg(short, long, default_value = "9160")]
    port: u16,

    /// Gateway listen port
    #[arg(short = 'x', long, default_value = "10000")]
    proxy_port: u16,

    /// Size of the worker pool (maximum concurrency)
    #[arg(short = 't', long, default_value = "20")]
    threadpool_size: usize,

    /// Verbose (print request/response data)
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    // Initialize tracing/logging
    let default_filter = if args.verbose {
        "debug"
    } else {
        "info,rowgate=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    tracing::info!("rowgate v{}", rowgate::VERSION);
    tracing::info!("backend: {}:{}", args.host, args.port);
    tracing::info!("listening port: {}", args.proxy_port);

    let config = Config::builder()
        .backend_addr(format!("{}:{}", args.host, args.port))
        .listen_addr(format!("0.0.0.0:{}", args.proxy_port))
        .worker_threads(args.threadpool_size)
        .build();

    let connector = Arc::new(ThriftConnector::new(
        config.backend_addr.clone(),
        config.backend_timeout(),
    ));

    // The cache loads before the listener accepts; an unreachable backend
    // is fatal here.
    let schema = match SchemaCache::load(connector.as_ref()) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            tracing::error!("failed to load schema from backend: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!("schema cache loaded");

    let gateway = Arc::new(Gateway::new(schema, connector));
    let server = match Server::bind(&config, gateway) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("failed to bind {}: {}", config.listen_addr, e);
            std::process::exit(1);
        }
    };

    // Set up Ctrl+C handler
    let shutdown = server.shutdown_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        tracing::info!("received Ctrl+C, initiating shutdown...");
        shutdown.store(true, std::sync::atomic::Ordering::Relaxed);
    }) {
        tracing::warn!("could not install Ctrl+C handler: {}", e);
    }

    if let Err(e) = server.run() {
        tracing::error!("server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("server stopped");
}
