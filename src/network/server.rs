//! TCP Server
//!
//! Accepts connections and dispatches each one to the worker pool as a
//! long-lived session job.

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::Config;
use crate::error::Result;
use crate::pool::WorkerPool;
use crate::store::Store;

use super::Session;

/// How long the accept loop sleeps when no connection is pending
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Cloneable flag that stops the accept loop
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// TCP server for Undis
pub struct Server {
    config: Config,
    store: Arc<Store>,
    listener: TcpListener,
    pool: WorkerPool,
    shutdown: ShutdownHandle,
}

impl Server {
    /// Bind the listener and start the worker pool
    ///
    /// Failing to bind is the one fatal startup error.
    pub fn bind(config: Config, store: Arc<Store>) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(&config.listen_addr)?;
        // Non-blocking accept so the loop can notice shutdown
        listener.set_nonblocking(true)?;

        let pool = WorkerPool::from_config(&config)?;

        tracing::info!("Server initialized on {}", listener.local_addr()?);

        Ok(Self {
            config,
            store,
            listener,
            pool,
            shutdown: ShutdownHandle::new(),
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle that stops `run` from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Accept connections until shutdown is requested (blocking)
    ///
    /// On shutdown the pool is stopped: idle workers exit, sessions still
    /// in progress are left to finish on their own.
    pub fn run(&self) -> Result<()> {
        tracing::info!("Waiting for connections...");

        while !self.shutdown.is_shutdown() {
            match self.listener.accept() {
                Ok((stream, addr)) => self.dispatch(stream, addr),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }

        tracing::info!("Stopping...");
        self.pool.shutdown();
        Ok(())
    }

    fn dispatch(&self, stream: TcpStream, addr: SocketAddr) {
        tracing::debug!("Got connection from {}", addr);

        if let Err(e) = stream.set_nonblocking(false) {
            tracing::warn!("Dropping connection from {}: {}", addr, e);
            return;
        }
        // Disable Nagle's algorithm for low latency
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!("Could not set TCP_NODELAY for {}: {}", addr, e);
        }

        let session = Session::new(stream, Arc::clone(&self.store), &self.config)
            .with_peer_addr(addr.to_string());

        let queued = self.pool.queue_job(move || {
            if let Err(e) = session.run() {
                tracing::debug!("Session ended with error: {}", e);
            }
        });
        if let Err(e) = queued {
            tracing::warn!("Dropping connection from {}: {}", addr, e);
        }
    }

    /// Get the worker pool
    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Get the shared store
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
