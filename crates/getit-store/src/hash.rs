//! DJB2 hashing and probe arithmetic.

/// DJB2 over the key bytes in wrapping u64 arithmetic.
pub(crate) fn hash_key(key: &str) -> u64 {
    let mut hash: u64 = 5381;
    for &b in key.as_bytes() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_add(hash)
            .wrapping_add(b as u64);
    }
    hash
}

/// The primary slot index for a hash. Slot 0 is the header, so indices are
/// 1-based.
pub(crate) fn primary_index(hash: u64, capacity: u64) -> u64 {
    (hash % capacity) + 1
}

/// The probe budget for a table of the given capacity.
pub(crate) fn max_probe(capacity: u64) -> u64 {
    (capacity / 10).max(3)
}

/// The next slot index in the probe sequence, wrapping past the last slot
/// back to slot 1.
pub(crate) fn probe_step(index: u64, capacity: u64) -> u64 {
    if index >= capacity {
        1
    } else {
        index + 1
    }
}
