//! Engine integration tests.
//!
//! - `engine.rs`  - dispatch-level table semantics (round-trips, clears,
//!   arithmetic, probe bounds, on-disk bytes)
//! - `resize.rs`  - manual and load-factor-triggered resizing
//! - `streams.rs` - stream fan-out semantics

mod streams;

use crate::hash::{hash_key, primary_index};
use crate::Store;
use getit_config_and_utils::Paths;
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::mpsc;

/// Open a fresh store in a temp directory.
pub(crate) fn open_test_store() -> (Arc<Store>, mpsc::Receiver<u64>, Paths, TempDir) {
    let dir = TempDir::new().unwrap();
    let paths = Paths::with_base_dir(dir.path().to_path_buf(), "store");
    let (store, resize_rx) = Store::open(&paths).unwrap();
    (store, resize_rx, paths, dir)
}

/// Generate `n` distinct keys sharing a primary slot index at the given
/// capacity.
pub(crate) fn colliding_keys(capacity: u64, n: usize) -> Vec<String> {
    let mut groups: HashMap<u64, Vec<String>> = HashMap::new();
    for i in 0u64.. {
        let key = format!("key{i}");
        let index = primary_index(hash_key(&key), capacity);
        let group = groups.entry(index).or_default();
        group.push(key);
        if group.len() == n {
            return group.clone();
        }
    }
    unreachable!()
}
