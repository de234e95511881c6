//! # Undis
//!
//! An in-memory key-value cache server with:
//! - A memcached-style line protocol (`set`/`add`/`replace`/`append`/`prepend`,
//!   `get`, `delete`)
//! - Per-entry flags and time-based expiry
//! - A binary snapshot loaded at startup and written at shutdown
//! - A self-resizing worker pool, one worker per live connection
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                             │
//! │                  (accept loop, Dispatcher)                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ queue_job(session)
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    Worker Pool                              │
//! │          (min..max threads, FIFO job queue)                 │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ one worker per connection
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      Session                                │
//! │        (line buffer → Command → reply, until quit)          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!                       ▼
//!               ┌───────────────┐         ┌──────────────┐
//!               │     Store     │ ──────► │   Snapshot   │
//!               │   (RwLock)    │ ◄────── │   ("UNDS")   │
//!               └───────────────┘         └──────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod store;
pub mod pool;
pub mod protocol;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{UndisError, Result};
pub use config::Config;
pub use store::{Store, StoredEntry};
pub use pool::WorkerPool;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of Undis
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
