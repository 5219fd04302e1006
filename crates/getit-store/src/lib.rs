//! The getit storage engine.
//!
//! A file-backed open-addressing hash table with fixed 66-byte slots and
//! linear probing. This crate provides:
//! - The on-disk slot codec
//! - DJB2 hashing and bounded probe arithmetic
//! - The entry table operations (store, load, add/sub, clear, clear-all)
//! - The load-factor-driven resize controller
//! - The multi-worker stream engine for bulk listing verbs
//! - The request dispatcher with its lock discipline

mod error;
mod hash;
mod meta;
mod resize;
mod slot;
mod store;
mod stream;
mod table;

#[cfg(test)]
mod tests;

pub use error::{EngineError, EngineResult};
pub use meta::{StoreMetadata, DOWN_RESIZE_LOAD, MIN_CAPACITY, UP_RESIZE_LOAD};
pub use slot::{file_size, slot_offset, SlotEntry, SLOT_SIZE};
pub use store::{Store, RESIZE_QUEUE_SIZE};
pub use stream::{STREAM_BUFFER_SIZE, STREAM_WORKER_COUNT};
