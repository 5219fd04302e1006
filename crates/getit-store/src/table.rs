//! Slot table operations over an open store file.
//!
//! These are synchronous and operate on a file handle the dispatcher opened
//! under the appropriate lock. Every mutation keeps the header's occupied
//! count in step with the in-memory metadata.

use crate::hash::{hash_key, max_probe, primary_index, probe_step};
use crate::slot::{
    decode_slot, encode_slot, encode_value_region, slot_offset, SlotEntry, SLOT_SIZE,
    VALUE_TYPE_OFFSET,
};
use crate::{EngineError, EngineResult, StoreMetadata};
use getit_protocol::Value;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use tracing::debug;

/// The slot a key's probe sequence resolved to: either the slot holding the
/// key or the first empty slot.
pub(crate) struct ResolvedSlot {
    pub index: u64,
    pub entry: Option<SlotEntry>,
}

/// Read the occupied count from the header.
pub(crate) fn read_header(file: &mut File) -> EngineResult<u64> {
    let mut buf = [0u8; 4];
    file.seek(SeekFrom::Start(0))?;
    file.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf) as u64)
}

/// Rewrite the header's occupied count.
pub(crate) fn write_header(file: &mut File, occupied: u64) -> EngineResult<()> {
    file.seek(SeekFrom::Start(0))?;
    file.write_all(&(occupied as u32).to_be_bytes())?;
    Ok(())
}

/// Read the raw bytes of one slot.
pub(crate) fn read_slot(file: &mut File, index: u64) -> EngineResult<[u8; SLOT_SIZE]> {
    let mut buf = [0u8; SLOT_SIZE];
    file.seek(SeekFrom::Start(slot_offset(index)))?;
    file.read_exact(&mut buf)?;
    Ok(buf)
}

/// Write the raw bytes of one slot in a single write.
pub(crate) fn write_slot(file: &mut File, index: u64, buf: &[u8; SLOT_SIZE]) -> EngineResult<()> {
    file.seek(SeekFrom::Start(slot_offset(index)))?;
    file.write_all(buf)?;
    Ok(())
}

/// Probe from the key's primary index to the slot holding the key or the
/// first empty slot, within the probe budget.
pub(crate) fn resolve_slot(
    file: &mut File,
    meta: &StoreMetadata,
    key: &str,
) -> EngineResult<ResolvedSlot> {
    let capacity = meta.capacity();
    let size_bytes = meta.size_bytes();
    let mut index = primary_index(hash_key(key), capacity);

    for _ in 0..max_probe(capacity) {
        if slot_offset(index) >= size_bytes {
            return Err(EngineError::OutsideFile(index));
        }
        let buf = read_slot(file, index)?;
        match decode_slot(&buf)? {
            None => return Ok(ResolvedSlot { index, entry: None }),
            Some(entry) if entry.key == key => {
                return Ok(ResolvedSlot {
                    index,
                    entry: Some(entry),
                })
            }
            Some(entry) => {
                debug!(key, other = %entry.key, index, "Collision");
                index = probe_step(index, capacity);
            }
        }
    }

    debug!(key, index, "Probe budget exhausted");
    Err(EngineError::ProbeExhausted)
}

/// Store a key/value pair. Returns 1 when a new slot was occupied, 0 when an
/// existing slot was overwritten, and whether the insert was new (which
/// drives the up-resize check).
pub(crate) fn store_entry(
    file: &mut File,
    meta: &StoreMetadata,
    key: &str,
    value: &Value,
) -> EngineResult<(Value, bool)> {
    let resolved = resolve_slot(file, meta, key)?;
    let is_new = resolved.entry.is_none();
    if is_new {
        let occupied = meta.incr_occupied();
        write_header(file, occupied)?;
    }
    write_slot(file, resolved.index, &encode_slot(key, value))?;
    Ok((Value::Int(if is_new { 1 } else { 0 }), is_new))
}

/// Load the value stored under a key.
pub(crate) fn load_entry(file: &mut File, meta: &StoreMetadata, key: &str) -> EngineResult<Value> {
    let resolved = resolve_slot(file, meta, key)?;
    match resolved.entry {
        Some(entry) => Ok(entry.value),
        None => Err(EngineError::NotFound),
    }
}

/// Add a delta to (or subtract it from) the int value stored under a key,
/// rewriting only the value region of the slot.
pub(crate) fn arithmetic_entry(
    file: &mut File,
    meta: &StoreMetadata,
    key: &str,
    delta: i32,
    subtract: bool,
) -> EngineResult<Value> {
    let resolved = resolve_slot(file, meta, key)?;
    let entry = resolved.entry.ok_or(EngineError::NotFound)?;
    let current = match entry.value {
        Value::Int(i) => i as i64,
        Value::Str(_) => return Err(EngineError::TypeMismatch),
    };

    let delta = if subtract {
        -(delta as i64)
    } else {
        delta as i64
    };
    let next =
        i32::try_from(current + delta).map_err(|_| EngineError::Overflow)?;

    file.seek(SeekFrom::Start(
        slot_offset(resolved.index) + VALUE_TYPE_OFFSET as u64,
    ))?;
    file.write_all(&encode_value_region(&Value::Int(next)))?;
    Ok(Value::Int(next))
}

/// Clear the slot holding a key by zeroing its set flag. Residual payload
/// bytes remain until overwritten.
pub(crate) fn clear_entry(file: &mut File, meta: &StoreMetadata, key: &str) -> EngineResult<()> {
    let resolved = resolve_slot(file, meta, key)?;
    if resolved.entry.is_none() {
        return Err(EngineError::NotFound);
    }

    file.seek(SeekFrom::Start(slot_offset(resolved.index)))?;
    file.write_all(&[0])?;

    let occupied = meta.decr_occupied();
    write_header(file, occupied)?;
    Ok(())
}

/// Truncate the table back to the minimum capacity and zero-fill it.
pub(crate) fn clear_all(file: &mut File, meta: &StoreMetadata) -> EngineResult<()> {
    let min_bytes = meta.min_file_bytes();
    file.set_len(min_bytes)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(&vec![0u8; min_bytes as usize])?;
    meta.reset_to_min();
    Ok(())
}
