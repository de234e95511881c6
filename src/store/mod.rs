//! Store Module
//!
//! In-memory key → entry map with TTL visibility and snapshot persistence.
//!
//! ## Responsibilities
//! - Shared-read / exclusive-write access through one RwLock (no sharding)
//! - Lazy expiry: expired entries are hidden from reads but stay in the map
//!   until deleted, overwritten, or left out of the next snapshot
//! - Binary snapshot load at startup and save at shutdown
//!
//! ## Expiration Encoding
//! The client-supplied `exptime` is converted once, at entry creation:
//! ```text
//!   exptime < 0                 → 0 (already expired)
//!   exptime == 0                → u32::MAX (never expires)
//!   1 ..= 30 days (in seconds)  → now + exptime
//!   > 30 days                   → exptime (absolute unix seconds)
//! ```

mod snapshot;
mod table;

use std::time::{SystemTime, UNIX_EPOCH};

pub use snapshot::{read_snapshot, write_snapshot, MAGIC};
pub use table::Store;

/// Stored expiration for entries that never expire
pub const NEVER_EXPIRES: u32 = u32::MAX;

/// Largest `exptime` still treated as an offset from now (30 days)
pub const MAX_RELATIVE_EXPTIME: i64 = 30 * 24 * 60 * 60;

/// A value together with its client flags and absolute expiration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    /// Raw value bytes
    pub value: Vec<u8>,

    /// Opaque client tag, returned verbatim
    pub flags: u32,

    /// Absolute unix seconds after which the entry is invisible
    pub expiration: u32,
}

impl StoredEntry {
    /// Build an entry, encoding `exptime` against the current clock
    pub fn new(value: impl Into<Vec<u8>>, flags: u32, exptime: i64) -> Self {
        Self::with_expiration(value, flags, encode_expiration(exptime, unix_now()))
    }

    /// Build an entry from an already-absolute expiration
    pub fn with_expiration(value: impl Into<Vec<u8>>, flags: u32, expiration: u32) -> Self {
        Self {
            value: value.into(),
            flags,
            expiration,
        }
    }

    /// Whether the entry is visible at `now`
    #[inline]
    pub fn is_live(&self, now: u32) -> bool {
        self.expiration > now
    }
}

/// Convert a client `exptime` into an absolute expiration
pub fn encode_expiration(exptime: i64, now: u32) -> u32 {
    match exptime {
        e if e < 0 => 0,
        0 => NEVER_EXPIRES,
        e if e <= MAX_RELATIVE_EXPTIME => now.saturating_add(e as u32),
        e => u32::try_from(e).unwrap_or(NEVER_EXPIRES),
    }
}

/// Current unix time in whole seconds, saturated to the u32 range
pub fn unix_now() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u32::try_from(d.as_secs()).unwrap_or(u32::MAX))
        .unwrap_or(0)
}
