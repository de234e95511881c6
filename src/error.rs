//! Error types for Undis
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using UndisError
pub type Result<T> = std::result::Result<T, UndisError>;

/// Unified error type for Undis operations
#[derive(Debug, Error)]
pub enum UndisError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Snapshot Errors
    // -------------------------------------------------------------------------
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    /// Bad data sent by a client; reported as `CLIENT_ERROR <message>`
    #[error("{0}")]
    ClientData(String),

    /// A command was executed while spent, empty, or through the wrong phase
    #[error("Command not executable: {0}")]
    CommandNotExecutable(&'static str),

    /// Unexpected reply seen by the client side of the protocol
    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Concurrency Errors
    // -------------------------------------------------------------------------
    #[error("Worker pool is shut down")]
    PoolClosed,
}

impl UndisError {
    /// True for errors caused by what the client sent, as opposed to faults
    /// inside the server.
    pub fn is_client_error(&self) -> bool {
        matches!(self, UndisError::ClientData(_))
    }
}
