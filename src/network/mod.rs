//! Network Module
//!
//! TCP server, per-connection sessions, and a blocking client.
//!
//! ## Architecture
//! - Single acceptor thread (non-blocking accept, polls the shutdown flag)
//! - Each accepted connection becomes one job on the worker pool and keeps
//!   its worker until the client quits or disconnects
//! - Sessions share one `Store`

mod client;
mod server;
mod session;

pub use client::{Client, Value};
pub use server::{Server, ShutdownHandle};
pub use session::Session;
