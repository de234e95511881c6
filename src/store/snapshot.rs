//! Snapshot format
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Header (8 bytes)                                        │
//! │   Magic: "UNDS" (4) | RecordCount: u32 (4)              │
//! ├─────────────────────────────────────────────────────────┤
//! │ Records (variable)                                      │
//! │   [Expiration: u32]                                     │
//! │   [KeyLen: u32][Key]                                    │
//! │   [ValLen: u32][Value]                                  │
//! │   [Flags: u32]                                          │
//! │   ... repeated RecordCount times ...                    │
//! └─────────────────────────────────────────────────────────┘
//! ```
//! All integers are little-endian. Only entries live at write time are
//! written; the count is back-patched once the records are out.

use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom, Write};

use crate::error::{Result, UndisError};

use super::StoredEntry;

/// Magic bytes identifying an Undis snapshot
pub const MAGIC: &[u8; 4] = b"UNDS";

/// Offset of the record count inside the header
const COUNT_OFFSET: u64 = 4;

/// Upper bound on map capacity reserved from an untrusted header
const MAX_PREALLOCATED_RECORDS: usize = 64 * 1024;

/// Write every entry live at `now`, returning the number of records written
pub fn write_snapshot<W: Write + Seek>(
    writer: &mut W,
    entries: &HashMap<String, StoredEntry>,
    now: u32,
) -> Result<u32> {
    writer.write_all(MAGIC)?;
    writer.write_all(&0u32.to_le_bytes())?; // Placeholder for record count

    let mut count: u32 = 0;
    for (key, entry) in entries {
        if !entry.is_live(now) {
            continue;
        }

        writer.write_all(&entry.expiration.to_le_bytes())?;
        write_chunk(writer, key.as_bytes())?;
        write_chunk(writer, &entry.value)?;
        writer.write_all(&entry.flags.to_le_bytes())?;

        count = count.checked_add(1).ok_or_else(|| {
            UndisError::Snapshot("more than u32::MAX live entries".to_string())
        })?;
    }

    let end = writer.stream_position()?;
    writer.seek(SeekFrom::Start(COUNT_OFFSET))?;
    writer.write_all(&count.to_le_bytes())?;
    writer.seek(SeekFrom::Start(end))?;
    writer.flush()?;

    Ok(count)
}

/// Read a snapshot, dropping records that expired before `now`
///
/// Returns:
/// - `Ok(Some(map))` — a valid snapshot
/// - `Ok(None)` — no snapshot here (short file or foreign magic)
/// - `Err(..)` — the header was valid but the body is truncated or corrupt
pub fn read_snapshot<R: Read>(reader: &mut R, now: u32) -> Result<Option<HashMap<String, StoredEntry>>> {
    let mut magic = [0u8; 4];
    match reader.read_exact(&mut magic) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    if &magic != MAGIC {
        return Ok(None);
    }

    let count = read_u32(reader, "record count")?;
    let mut entries = HashMap::with_capacity((count as usize).min(MAX_PREALLOCATED_RECORDS));

    for index in 0..count {
        let expiration = read_u32(reader, "expiration")?;
        let key = read_chunk(reader, "key")?;
        let value = read_chunk(reader, "value")?;
        let flags = read_u32(reader, "flags")?;

        let key = String::from_utf8(key).map_err(|_| {
            UndisError::Snapshot(format!("record {} has a non UTF-8 key", index))
        })?;

        let entry = StoredEntry::with_expiration(value, flags, expiration);
        if entry.is_live(now) {
            entries.insert(key, entry);
        }
    }

    Ok(Some(entries))
}

fn write_chunk<W: Write>(writer: &mut W, bytes: &[u8]) -> Result<()> {
    let len = u32::try_from(bytes.len()).map_err(|_| {
        UndisError::Snapshot(format!("chunk of {} bytes exceeds u32 length", bytes.len()))
    })?;
    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(bytes)?;
    Ok(())
}

fn read_u32<R: Read>(reader: &mut R, field: &str) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf).map_err(|e| truncated(field, e))?;
    Ok(u32::from_le_bytes(buf))
}

fn read_chunk<R: Read>(reader: &mut R, field: &str) -> Result<Vec<u8>> {
    let len = read_u32(reader, field)? as usize;

    // take() keeps a corrupt length from allocating gigabytes up front
    let mut bytes = Vec::new();
    reader.by_ref().take(len as u64).read_to_end(&mut bytes)?;
    if bytes.len() != len {
        return Err(UndisError::Snapshot(format!(
            "truncated {}: expected {} bytes, got {}",
            field,
            len,
            bytes.len()
        )));
    }
    Ok(bytes)
}

fn truncated(field: &str, e: std::io::Error) -> UndisError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        UndisError::Snapshot(format!("truncated {}", field))
    } else {
        UndisError::Io(e)
    }
}
