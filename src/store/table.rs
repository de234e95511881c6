//! Store implementation
//!
//! HashMap-based store behind a single RwLock.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::error::{Result, UndisError};

use super::snapshot::{read_snapshot, write_snapshot};
use super::{unix_now, StoredEntry};

/// Thread-safe key-value store with lazy expiry
///
/// ## Concurrency:
/// - `entries`: one RwLock for the whole map
///   - `get` / `size` take the shared lock and may run together
///   - every mutator takes the exclusive lock for its full duration
/// - No operation spans more than one lock acquisition, so a
///   read-then-write sequence issued as two calls is not atomic
pub struct Store {
    /// Key → entry map, including expired entries not yet purged
    entries: RwLock<HashMap<String, StoredEntry>>,

    /// Snapshot file used by `save()`, if any
    snapshot_path: Option<PathBuf>,
}

impl Store {
    /// Create an empty in-memory store with no snapshot file
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            snapshot_path: None,
        }
    }

    /// Create a store backed by a snapshot file
    ///
    /// Loading is best-effort: a missing, foreign, or corrupt file leaves
    /// the store empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let store = Self {
            entries: RwLock::new(HashMap::new()),
            snapshot_path: Some(path.clone()),
        };

        match store.load_from(&path) {
            Ok(count) => {
                tracing::info!("Loaded {} entries from {}", count, path.display());
            }
            Err(e) => {
                tracing::warn!(
                    "Ignoring unreadable snapshot {}: {}; starting empty",
                    path.display(),
                    e
                );
            }
        }

        store
    }

    // =========================================================================
    // Reads (shared lock)
    // =========================================================================

    /// Get a live entry by key
    pub fn get(&self, key: &str) -> Option<StoredEntry> {
        let now = unix_now();
        let entries = self.entries.read();
        entries.get(key).filter(|e| e.is_live(now)).cloned()
    }

    /// Number of entries in the map, counting expired ones not yet purged
    pub fn size(&self) -> usize {
        self.entries.read().len()
    }

    // =========================================================================
    // Writes (exclusive lock)
    // =========================================================================

    /// Insert or overwrite unconditionally
    pub fn set(&self, key: impl Into<String>, value: impl Into<Vec<u8>>, flags: u32, exptime: i64) {
        let entry = StoredEntry::new(value, flags, exptime);
        self.entries.write().insert(key.into(), entry);
    }

    /// Insert only if the key is absent
    pub fn add(&self, key: impl Into<String>, value: impl Into<Vec<u8>>, flags: u32, exptime: i64) -> bool {
        let mut entries = self.entries.write();
        match entries.entry(key.into()) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(StoredEntry::new(value, flags, exptime));
                true
            }
        }
    }

    /// Overwrite only if the key is present
    pub fn replace(&self, key: &str, value: impl Into<Vec<u8>>, flags: u32, exptime: i64) -> bool {
        let mut entries = self.entries.write();
        match entries.get_mut(key) {
            Some(existing) => {
                *existing = StoredEntry::new(value, flags, exptime);
                true
            }
            None => false,
        }
    }

    /// Append to an existing value, keeping its flags and expiration
    pub fn append(&self, key: &str, suffix: &[u8]) -> bool {
        let mut entries = self.entries.write();
        match entries.get_mut(key) {
            Some(existing) => {
                existing.value.extend_from_slice(suffix);
                true
            }
            None => false,
        }
    }

    /// Prepend to an existing value, keeping its flags and expiration
    pub fn prepend(&self, key: &str, prefix: &[u8]) -> bool {
        let mut entries = self.entries.write();
        match entries.get_mut(key) {
            Some(existing) => {
                existing.value.splice(0..0, prefix.iter().copied());
                true
            }
            None => false,
        }
    }

    /// Remove a key, live or expired
    pub fn delete(&self, key: &str) -> bool {
        self.entries.write().remove(key).is_some()
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Write the configured snapshot file
    ///
    /// Returns the number of records written, or 0 for a store without a
    /// snapshot path.
    pub fn save(&self) -> Result<u32> {
        match &self.snapshot_path {
            Some(path) => self.save_to(path),
            None => {
                tracing::debug!("Store has no snapshot path; skipping save");
                Ok(0)
            }
        }
    }

    /// Write every live entry to `path`, holding the exclusive lock throughout
    pub fn save_to(&self, path: &Path) -> Result<u32> {
        let entries = self.entries.write();

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        let mut writer = BufWriter::new(file);

        let count = write_snapshot(&mut writer, &entries, unix_now())?;

        let file = writer.into_inner().map_err(|e| {
            UndisError::Snapshot(format!("Failed to flush snapshot: {}", e))
        })?;
        file.sync_all()?;

        tracing::info!("Saved {} entries to {}", count, path.display());
        Ok(count)
    }

    /// Replace the store contents with the snapshot at `path`
    ///
    /// A missing file or one without the magic header is not an error and
    /// leaves the store untouched. Returns the number of entries loaded.
    pub fn load_from(&self, path: &Path) -> Result<usize> {
        let mut entries = self.entries.write();

        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No snapshot at {}", path.display());
                return Ok(0);
            }
            Err(e) => return Err(e.into()),
        };

        match read_snapshot(&mut BufReader::new(file), unix_now())? {
            Some(loaded) => {
                *entries = loaded;
                Ok(entries.len())
            }
            None => {
                tracing::warn!("{} is not an undis snapshot; ignoring it", path.display());
                Ok(0)
            }
        }
    }

    /// Get the snapshot path, if one is configured
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
