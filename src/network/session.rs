//! Session
//!
//! Drives one client connection from first prompt to disconnect.

use std::io::{ErrorKind, Read, Write};
use std::sync::Arc;

use bytes::BytesMut;

use crate::config::Config;
use crate::error::{Result, UndisError};
use crate::protocol::{client_error, server_error, Command, CommandStatus, LineBuffer, ERROR};
use crate::store::Store;

/// Handles a single client connection
///
/// The session owns its stream; the connection is released when the
/// session is dropped, whichever way `run` exits.
pub struct Session<S: Read + Write> {
    /// Duplex byte stream to the client
    stream: S,

    /// Bytes read but not yet consumed as a line
    lines: LineBuffer,

    /// Shared store
    store: Arc<Store>,

    /// Prompt written before each line read
    prompt: String,

    /// Peer address for logging
    peer_addr: String,
}

impl<S: Read + Write> Session<S> {
    /// Create a session over `stream`
    pub fn new(stream: S, store: Arc<Store>, config: &Config) -> Self {
        Self {
            stream,
            lines: LineBuffer::new(config.session_buffer_size),
            store,
            prompt: config.prompt.clone(),
            peer_addr: "unknown".to_string(),
        }
    }

    /// Set the peer address used in log messages
    pub fn with_peer_addr(mut self, peer_addr: impl Into<String>) -> Self {
        self.peer_addr = peer_addr.into();
        self
    }

    /// Serve the connection until `quit`, end of stream, or a write failure
    pub fn run(mut self) -> Result<()> {
        tracing::debug!("Session started for {}", self.peer_addr);

        let result = self.serve();
        match &result {
            Ok(()) => tracing::debug!("Session for {} closed", self.peer_addr),
            Err(UndisError::Io(e)) if is_disconnect(e) => {
                tracing::debug!("Client {} went away: {}", self.peer_addr, e);
                return Ok(());
            }
            Err(e) => tracing::warn!("Session for {} failed: {}", self.peer_addr, e),
        }
        result
    }

    fn serve(&mut self) -> Result<()> {
        loop {
            self.stream.write_all(self.prompt.as_bytes())?;
            self.stream.flush()?;

            let Some(line) = self.next_line()? else {
                return Ok(());
            };
            if &line[..] == b"quit" {
                return Ok(());
            }

            let mut command = Command::parse(&line);
            tracing::trace!("Received command from {}: {:?}", self.peer_addr, command);

            let outcome = match command.status() {
                CommandStatus::ValidCommand => command.execute(&self.store),
                CommandStatus::DataRequired => {
                    let Some(data) = self.next_line()? else {
                        return Ok(());
                    };
                    command.execute_with_data(&self.store, &data)
                }
                CommandStatus::InvalidCommand => Ok(ERROR.to_vec()),
            };

            let reply = match outcome {
                Ok(reply) => reply,
                Err(e) if e.is_client_error() => client_error(&e.to_string()),
                Err(e) => {
                    tracing::error!("Command from {} faulted: {}", self.peer_addr, e);
                    server_error(&e.to_string())
                }
            };

            self.send(&reply)?;
        }
    }

    /// Next line from the client, or `None` when the session should end
    fn next_line(&mut self) -> Result<Option<BytesMut>> {
        match self.lines.read_line(&mut self.stream) {
            Ok(line) => Ok(line),
            Err(e) if e.is_client_error() => {
                tracing::debug!("Closing {}: {}", self.peer_addr, e);
                if let Err(send_err) = self.send(&client_error(&e.to_string())) {
                    tracing::debug!("Could not notify {}: {}", self.peer_addr, send_err);
                }
                Ok(None)
            }
            Err(UndisError::Io(e)) => {
                // A failed read ends the session like `quit`
                tracing::debug!("Read from {} failed: {}", self.peer_addr, e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.stream.write_all(bytes)?;
        self.stream.flush()?;
        Ok(())
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

fn is_disconnect(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::ConnectionAborted | ErrorKind::ConnectionReset | ErrorKind::BrokenPipe
    )
}
