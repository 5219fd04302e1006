//! In-memory store metadata.
//!
//! One instance per open store, owned by the `Store`. Fields are atomics:
//! they are mutated only under the exclusive file lock (or the resize commit
//! path), while read-only paths observe them without locking and may see
//! values slightly stale between a resize commit and a subsequent read.

use crate::slot::file_size;
use std::sync::atomic::{AtomicU64, Ordering};

/// Minimum table capacity in slots. The store file never shrinks below
/// `(MIN_CAPACITY + 1) * 66` bytes.
pub const MIN_CAPACITY: u64 = 64;

/// Load factor above which an insert enqueues an up-resize.
pub const UP_RESIZE_LOAD: f64 = 0.4;

/// Load factor below which a delete enqueues a down-resize.
pub const DOWN_RESIZE_LOAD: f64 = 0.05;

/// Mutable metadata for an open store.
#[derive(Debug)]
pub struct StoreMetadata {
    size_bytes: AtomicU64,
    capacity: AtomicU64,
    occupied: AtomicU64,
    min_file_bytes: u64,
}

impl StoreMetadata {
    /// Create metadata for a table of the given capacity and occupancy.
    pub fn new(capacity: u64, occupied: u64) -> Self {
        Self {
            size_bytes: AtomicU64::new(file_size(capacity)),
            capacity: AtomicU64::new(capacity),
            occupied: AtomicU64::new(occupied),
            min_file_bytes: file_size(MIN_CAPACITY),
        }
    }

    /// Current file size in bytes.
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes.load(Ordering::Relaxed)
    }

    /// Current table capacity in slots.
    pub fn capacity(&self) -> u64 {
        self.capacity.load(Ordering::Relaxed)
    }

    /// Current occupied slot count.
    pub fn occupied(&self) -> u64 {
        self.occupied.load(Ordering::Relaxed)
    }

    /// Current load factor (occupied / capacity).
    pub fn load_ratio(&self) -> f64 {
        self.occupied() as f64 / self.capacity() as f64
    }

    /// The smallest permitted file size, memoized at construction.
    pub fn min_file_bytes(&self) -> u64 {
        self.min_file_bytes
    }

    /// Record a newly occupied slot. Returns the new count.
    pub fn incr_occupied(&self) -> u64 {
        self.occupied.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Record a cleared slot. Returns the new count.
    pub fn decr_occupied(&self) -> u64 {
        self.occupied.fetch_sub(1, Ordering::Relaxed) - 1
    }

    /// Record a committed resize to the given capacity.
    pub fn apply_resize(&self, capacity: u64) {
        self.capacity.store(capacity, Ordering::Relaxed);
        self.size_bytes.store(file_size(capacity), Ordering::Relaxed);
    }

    /// Reset to an empty minimum-capacity table (clear-all).
    pub fn reset_to_min(&self) {
        self.capacity.store(MIN_CAPACITY, Ordering::Relaxed);
        self.size_bytes.store(self.min_file_bytes, Ordering::Relaxed);
        self.occupied.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::SLOT_SIZE;

    #[test]
    fn test_new_metadata() {
        let meta = StoreMetadata::new(64, 10);
        assert_eq!(meta.capacity(), 64);
        assert_eq!(meta.occupied(), 10);
        assert_eq!(meta.size_bytes(), 65 * SLOT_SIZE as u64);
        assert_eq!(meta.min_file_bytes(), 65 * SLOT_SIZE as u64);
    }

    #[test]
    fn test_load_ratio() {
        let meta = StoreMetadata::new(100, 40);
        assert!((meta.load_ratio() - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn test_occupied_counters() {
        let meta = StoreMetadata::new(64, 1);
        assert_eq!(meta.incr_occupied(), 2);
        assert_eq!(meta.decr_occupied(), 1);
        assert_eq!(meta.decr_occupied(), 0);
    }

    #[test]
    fn test_apply_resize() {
        let meta = StoreMetadata::new(64, 20);
        meta.apply_resize(128);
        assert_eq!(meta.capacity(), 128);
        assert_eq!(meta.size_bytes(), 129 * SLOT_SIZE as u64);
        assert_eq!(meta.occupied(), 20);
    }

    #[test]
    fn test_reset_to_min() {
        let meta = StoreMetadata::new(512, 100);
        meta.reset_to_min();
        assert_eq!(meta.capacity(), MIN_CAPACITY);
        assert_eq!(meta.occupied(), 0);
        assert_eq!(meta.size_bytes(), meta.min_file_bytes());
    }
}
