//! The stream engine for the bulk listing verbs.
//!
//! Workers share an atomic slot-index counter and fan out over the slot
//! space, emitting one response per slot into a bounded channel. The first
//! worker to step past the end of the file cancels the shared token; the
//! others drain their current slot and exit. Responses are unordered with
//! respect to slot index.

use crate::slot::{decode_slot, slot_offset, SlotEntry};
use crate::table::read_slot;
use getit_protocol::{Response, Status, Value, Verb};
use std::fs::File;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Capacity of the stream response channel.
pub const STREAM_BUFFER_SIZE: usize = 100;

/// Number of worker tasks per stream.
pub const STREAM_WORKER_COUNT: usize = 10;

/// How a slot entry is projected into a stream frame.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Projection {
    Keys,
    Values,
    Items,
}

impl Projection {
    pub(crate) fn from_verb(verb: Verb) -> Option<Self> {
        match verb {
            Verb::Keys => Some(Projection::Keys),
            Verb::Values => Some(Projection::Values),
            Verb::Items => Some(Projection::Items),
            _ => None,
        }
    }

    fn project(self, entry: SlotEntry) -> Value {
        match self {
            Projection::Keys => Value::Str(entry.key),
            Projection::Values => entry.value,
            Projection::Items => Value::Str(format!("{} {}", entry.key, entry.value)),
        }
    }
}

/// Spawn one stream worker on the blocking pool.
///
/// Unset slots are emitted as NotFound markers; the server filters those
/// before the socket. Empty-slot markers aside, a worker only stops early
/// when the token is cancelled or the receiver is gone.
pub(crate) fn spawn_worker(
    store_path: PathBuf,
    size_bytes: u64,
    projection: Projection,
    request_id: u8,
    tx: mpsc::Sender<Response>,
    token: CancellationToken,
    next_index: Arc<AtomicU64>,
) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        let mut file = match File::open(&store_path) {
            Ok(file) => file,
            Err(e) => {
                warn!(error = %e, "Stream worker failed to open store");
                let _ = tx.blocking_send(Response::with_status(request_id, Status::ServerError));
                token.cancel();
                return;
            }
        };

        loop {
            if token.is_cancelled() {
                break;
            }
            let index = next_index.fetch_add(1, Ordering::Relaxed);
            if slot_offset(index) >= size_bytes {
                token.cancel();
                break;
            }

            let response = match read_slot(&mut file, index).and_then(|buf| decode_slot(&buf)) {
                Ok(None) => Response::with_status(request_id, Status::NotFound),
                Ok(Some(entry)) => Response::ok(request_id, Some(projection.project(entry))),
                Err(e) => {
                    warn!(error = %e, index, "Stream worker read failed");
                    token.cancel();
                    Response::with_status(request_id, Status::ServerError)
                }
            };

            if tx.blocking_send(response).is_err() {
                break;
            }
        }
    })
}
