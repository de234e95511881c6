//! Reply definitions
//!
//! Every reply line is CRLF-terminated.

use crate::store::StoredEntry;

/// Line terminator
pub const CRLF: &[u8] = b"\r\n";

pub const STORED: &[u8] = b"STORED\r\n";
pub const NOT_STORED: &[u8] = b"NOT_STORED\r\n";
pub const DELETED: &[u8] = b"DELETED\r\n";
pub const NOT_FOUND: &[u8] = b"NOT_FOUND\r\n";
pub const ERROR: &[u8] = b"ERROR\r\n";
pub const END: &[u8] = b"END\r\n";

/// Append `VALUE <key> <flags> <len>\r\n<value>\r\n` to `out`
pub fn write_value(out: &mut Vec<u8>, key: &str, entry: &StoredEntry) {
    out.extend_from_slice(
        format!("VALUE {} {} {}\r\n", key, entry.flags, entry.value.len()).as_bytes(),
    );
    out.extend_from_slice(&entry.value);
    out.extend_from_slice(CRLF);
}

/// `CLIENT_ERROR <message>\r\n`
pub fn client_error(message: &str) -> Vec<u8> {
    format!("CLIENT_ERROR {}\r\n", message).into_bytes()
}

/// `SERVER_ERROR <message>\r\n`
pub fn server_error(message: &str) -> Vec<u8> {
    format!("SERVER_ERROR {}\r\n", message).into_bytes()
}
