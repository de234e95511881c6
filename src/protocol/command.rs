//! Command definitions
//!
//! A `Command` is built from one request line and executed exactly once.
//!
//! ```text
//!   Empty ──parse──► Storage ──execute_with_data──► Empty (spent)
//!                  ► Retrieval / Deletion ──execute──► Empty (spent)
//!                  ► Empty (invalid line)
//! ```

use std::str::FromStr;

use crate::error::{Result, UndisError};
use crate::store::Store;

use super::response::{self, DELETED, END, NOT_FOUND, NOT_STORED, STORED};

/// Storage command kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOp {
    Set,
    Add,
    Replace,
    Append,
    Prepend,
}

impl StorageOp {
    /// Look up an op by its wire name (exact, case-sensitive)
    pub fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"set" => Some(StorageOp::Set),
            b"add" => Some(StorageOp::Add),
            b"replace" => Some(StorageOp::Replace),
            b"append" => Some(StorageOp::Append),
            b"prepend" => Some(StorageOp::Prepend),
            _ => None,
        }
    }

    /// Wire name of the op
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageOp::Set => "set",
            StorageOp::Add => "add",
            StorageOp::Replace => "replace",
            StorageOp::Append => "append",
            StorageOp::Prepend => "prepend",
        }
    }
}

/// What the session has to do next with a parsed command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    /// Ready to execute without a data block
    ValidCommand,

    /// A data block line must be read before executing
    DataRequired,

    /// Unknown or malformed line (also: spent command)
    InvalidCommand,
}

/// A parsed request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Command {
    /// Nothing to execute: invalid line or already executed
    #[default]
    Empty,

    /// `<op> <key> <flags> <exptime> <bytes>`
    Storage {
        op: StorageOp,
        key: String,
        flags: u32,
        exptime: i64,
        bytes: usize,
    },

    /// `get <key> [<key> ...]`
    Retrieval { keys: Vec<String> },

    /// `delete <key>`
    Deletion { key: String },
}

impl Command {
    /// Parse one request line (without its CRLF)
    pub fn parse(line: &[u8]) -> Self {
        let mut tokens = line
            .split(|b| b.is_ascii_whitespace())
            .filter(|t| !t.is_empty());

        let Some(name) = tokens.next() else {
            return Command::Empty;
        };

        if let Some(op) = StorageOp::from_name(name) {
            return Self::parse_storage(op, tokens).unwrap_or_default();
        }

        match name {
            b"get" => {
                let keys: Option<Vec<String>> = tokens.map(parse_key).collect();
                match keys {
                    Some(keys) if !keys.is_empty() => Command::Retrieval { keys },
                    _ => Command::Empty,
                }
            }
            b"delete" => tokens
                .next()
                .and_then(parse_key)
                .map(|key| Command::Deletion { key })
                .unwrap_or_default(),
            _ => Command::Empty,
        }
    }

    fn parse_storage<'a>(op: StorageOp, mut tokens: impl Iterator<Item = &'a [u8]>) -> Option<Self> {
        let key = parse_key(tokens.next()?)?;
        let flags = parse_number::<u32>(tokens.next()?)?;
        let exptime = parse_number::<i64>(tokens.next()?)?;
        let bytes = parse_number::<u32>(tokens.next()?)? as usize;

        Some(Command::Storage {
            op,
            key,
            flags,
            exptime,
            bytes,
        })
    }

    /// Replace this command with a freshly parsed line
    pub fn reset(&mut self, line: &[u8]) -> CommandStatus {
        *self = Self::parse(line);
        self.status()
    }

    pub fn status(&self) -> CommandStatus {
        match self {
            Command::Storage { .. } => CommandStatus::DataRequired,
            Command::Retrieval { .. } | Command::Deletion { .. } => CommandStatus::ValidCommand,
            Command::Empty => CommandStatus::InvalidCommand,
        }
    }

    /// Execute a retrieval or deletion command
    pub fn execute(&mut self, store: &Store) -> Result<Vec<u8>> {
        match std::mem::take(self) {
            Command::Retrieval { keys } => {
                let mut reply = Vec::new();
                for key in &keys {
                    if let Some(entry) = store.get(key) {
                        response::write_value(&mut reply, key, &entry);
                    }
                }
                reply.extend_from_slice(END);
                Ok(reply)
            }
            Command::Deletion { key } => {
                let reply = if store.delete(&key) { DELETED } else { NOT_FOUND };
                Ok(reply.to_vec())
            }
            Command::Empty => Err(UndisError::CommandNotExecutable(
                "command is empty or already executed",
            )),
            storage @ Command::Storage { .. } => {
                *self = storage;
                Err(UndisError::CommandNotExecutable(
                    "storage command requires a data block",
                ))
            }
        }
    }

    /// Execute a storage command with its data block
    ///
    /// The command is spent even when the data block is rejected.
    pub fn execute_with_data(&mut self, store: &Store, data: &[u8]) -> Result<Vec<u8>> {
        match std::mem::take(self) {
            Command::Storage {
                op,
                key,
                flags,
                exptime,
                bytes,
            } => {
                if data.len() != bytes {
                    return Err(UndisError::ClientData(format!(
                        "bad data chunk: declared {} bytes, got {}",
                        bytes,
                        data.len()
                    )));
                }

                let stored = match op {
                    StorageOp::Set => {
                        store.set(key, data, flags, exptime);
                        true
                    }
                    StorageOp::Add => store.add(key, data, flags, exptime),
                    StorageOp::Replace => store.replace(&key, data, flags, exptime),
                    StorageOp::Append => store.append(&key, data),
                    StorageOp::Prepend => store.prepend(&key, data),
                };

                let reply = if stored { STORED } else { NOT_STORED };
                Ok(reply.to_vec())
            }
            Command::Empty => Err(UndisError::CommandNotExecutable(
                "command is empty or already executed",
            )),
            other => {
                *self = other;
                Err(UndisError::CommandNotExecutable(
                    "only storage commands take a data block",
                ))
            }
        }
    }
}

fn parse_key(token: &[u8]) -> Option<String> {
    std::str::from_utf8(token).ok().map(str::to_owned)
}

fn parse_number<T: FromStr>(token: &[u8]) -> Option<T> {
    std::str::from_utf8(token).ok()?.parse().ok()
}
