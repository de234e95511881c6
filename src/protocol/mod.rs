//! Protocol Module
//!
//! Line-oriented, memcached-style text protocol.
//!
//! ## Requests
//! ```text
//! <op> <key> <flags> <exptime> <bytes>\r\n     op ∈ set|add|replace|append|prepend
//! <data block of exactly <bytes> bytes>\r\n
//!
//! get <key> [<key> ...]\r\n
//! delete <key>\r\n
//! quit\r\n
//! ```
//!
//! ## Replies
//! - `STORED` / `NOT_STORED`
//! - `VALUE <key> <flags> <len>\r\n<data>` per hit, then `END`
//! - `DELETED` / `NOT_FOUND`
//! - `ERROR` (unknown or malformed command)
//! - `CLIENT_ERROR <message>` (bad data from the client)
//! - `SERVER_ERROR <message>` (fault inside the server)

mod codec;
mod command;
mod response;

pub use codec::LineBuffer;
pub use command::{Command, CommandStatus, StorageOp};
pub use response::{
    client_error, server_error, write_value, CRLF, DELETED, END, ERROR, NOT_FOUND, NOT_STORED,
    STORED,
};
