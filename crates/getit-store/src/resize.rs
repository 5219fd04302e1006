//! Rebuilding the table into a temporary file.
//!
//! The scan runs under the readers' lock of the live file (the caller holds
//! it), so readers keep streaming while the new table is built. The
//! temporary file has no readers yet; a single mutex serializes writes into
//! it. The caller swaps the files under the writer lock afterwards.

use crate::hash::{hash_key, max_probe, primary_index, probe_step};
use crate::slot::{decode_slot, file_size, SLOT_SIZE};
use crate::table::{read_slot, write_header, write_slot};
use crate::{EngineError, EngineResult};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Workers rehashing slots into the temporary file.
const RESIZE_WORKER_COUNT: usize = 10;

/// Build a table of the target capacity in the temporary file, carrying over
/// every occupied slot of the live file. Leaves the live file untouched; a
/// stale temporary from an aborted attempt is overwritten.
pub(crate) async fn rebuild_into_temp(
    store_path: PathBuf,
    temp_path: &Path,
    capacity: u64,
    occupied: u64,
    target: u64,
) -> EngineResult<()> {
    let mut temp = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(temp_path)?;
    temp.set_len(file_size(target))?;
    write_header(&mut temp, occupied)?;

    let temp = Arc::new(Mutex::new(temp));
    let next_index = Arc::new(AtomicU64::new(1));

    let mut handles = Vec::with_capacity(RESIZE_WORKER_COUNT);
    for _ in 0..RESIZE_WORKER_COUNT {
        let store_path = store_path.clone();
        let temp = temp.clone();
        let next_index = next_index.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            copy_slots(&store_path, &temp, &next_index, capacity, target)
        }));
    }

    for handle in handles {
        handle
            .await
            .map_err(|e| EngineError::Io(std::io::Error::other(e)))??;
    }

    Ok(())
}

fn copy_slots(
    store_path: &Path,
    temp: &Mutex<File>,
    next_index: &AtomicU64,
    capacity: u64,
    target: u64,
) -> EngineResult<()> {
    let mut live = File::open(store_path)?;
    loop {
        let index = next_index.fetch_add(1, Ordering::Relaxed);
        if index > capacity {
            return Ok(());
        }
        let buf = read_slot(&mut live, index)?;
        if buf[0] == 0 {
            continue;
        }
        if let Some(entry) = decode_slot(&buf)? {
            place_slot(temp, &buf, &entry.key, target)?;
        }
    }
}

/// Probe for an empty slot in the temporary file and write the carried-over
/// slot bytes there verbatim.
fn place_slot(
    temp: &Mutex<File>,
    buf: &[u8; SLOT_SIZE],
    key: &str,
    target: u64,
) -> EngineResult<()> {
    let mut temp = temp
        .lock()
        .map_err(|_| EngineError::Io(std::io::Error::other("temp file mutex poisoned")))?;

    let mut index = primary_index(hash_key(key), target);
    for _ in 0..max_probe(target) {
        let slot = read_slot(&mut temp, index)?;
        if slot[0] == 0 {
            return write_slot(&mut temp, index, buf);
        }
        index = probe_step(index, target);
    }
    Err(EngineError::ProbeExhausted)
}
