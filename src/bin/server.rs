//! Undis Server Binary
//!
//! Starts the TCP server for Undis.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};
use undis::network::Server;
use undis::{Config, Store};

/// Undis Server
#[derive(Parser, Debug)]
#[command(name = "undis-server")]
#[command(about = "In-memory key-value cache speaking a memcached-style text protocol")]
#[command(version)]
struct Args {
    /// Snapshot file loaded at startup and written at shutdown
    #[arg(short = 'f', long = "file", default_value = "undis.db")]
    file: String,

    /// TCP port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,

    /// Workers kept alive when idle
    #[arg(long, default_value = "1")]
    min_workers: usize,

    /// Maximum workers (concurrent connections being served)
    #[arg(long, default_value = "10")]
    max_workers: usize,

    /// Seconds an extra worker may stay idle before it is reclaimed
    #[arg(long, default_value = "5")]
    idle_timeout_secs: u64,

    /// Per-connection line buffer size in bytes
    #[arg(long, default_value = "65536")]
    buffer_size: usize,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,undis=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("Undis Server v{}", undis::VERSION);
    tracing::info!("Snapshot file: {}", args.file);

    // Build config from args
    let config = Config::builder()
        .snapshot_path(&args.file)
        .listen_addr(format!("{}:{}", args.bind, args.port))
        .pool_min_workers(args.min_workers)
        .pool_max_workers(args.max_workers)
        .pool_idle_timeout(Duration::from_secs(args.idle_timeout_secs))
        .session_buffer_size(args.buffer_size)
        .build();

    let store = Arc::new(Store::open(&config.snapshot_path));

    let server = match Server::bind(config, Arc::clone(&store)) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    // Ctrl+C / SIGTERM stop the accept loop
    let shutdown = server.shutdown_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        tracing::info!("Received shutdown signal, initiating shutdown...");
        shutdown.shutdown();
    }) {
        tracing::warn!("Could not install signal handler: {}", e);
    }

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
    }

    // Best-effort final snapshot
    if let Err(e) = store.save() {
        tracing::error!("Failed to write snapshot: {}", e);
    }

    tracing::info!("Server stopped");
}
