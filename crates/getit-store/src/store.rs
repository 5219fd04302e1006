//! The open store and its request dispatcher.
//!
//! A `Store` owns the process-wide reader/writer lock over the live file and
//! the in-memory metadata. Verbs map onto lock modes: read-only verbs hold
//! the shared lock, read/write verbs the exclusive lock, streams hold an
//! owned shared guard for their whole fan-out, and resize manages both locks
//! itself. Every operation opens a fresh file handle under its lock.
//!
//! Resize triggers fired from the write path are submitted to a bounded
//! queue and executed by a dedicated task once the triggering operation has
//! released the exclusive lock; a held lock is never upgraded.

use crate::meta::{DOWN_RESIZE_LOAD, MIN_CAPACITY, UP_RESIZE_LOAD};
use crate::resize::rebuild_into_temp;
use crate::slot::{file_size, SLOT_SIZE};
use crate::stream::{spawn_worker, Projection, STREAM_BUFFER_SIZE, STREAM_WORKER_COUNT};
use crate::table::{
    arithmetic_entry, clear_all, clear_entry, load_entry, read_header, store_entry,
};
use crate::{EngineError, EngineResult, StoreMetadata};
use getit_config_and_utils::Paths;
use getit_protocol::{Request, Response, Value, Verb};
use std::fs::{File, OpenOptions};
use std::path::PathBuf;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Capacity of the queue feeding the resize task.
pub const RESIZE_QUEUE_SIZE: usize = 8;

/// An open store file with its lock, metadata and resize queue.
pub struct Store {
    store_path: PathBuf,
    temp_path: PathBuf,
    lock: Arc<RwLock<()>>,
    meta: StoreMetadata,
    resize_tx: mpsc::Sender<u64>,
}

impl Store {
    /// Open (or create) the store file and read its metadata.
    ///
    /// Returns the store and the receiving end of its resize queue; run the
    /// latter with [`Store::run_resize_queue`].
    pub fn open(paths: &Paths) -> EngineResult<(Arc<Self>, mpsc::Receiver<u64>)> {
        let store_path = paths.store_file();
        let temp_path = paths.temp_file();

        let meta = if store_path.exists() {
            let mut file = File::open(&store_path)?;
            let size = file.metadata()?.len();
            if size < 2 * SLOT_SIZE as u64 || size % SLOT_SIZE as u64 != 0 {
                return Err(EngineError::Decode(format!(
                    "store file size {size} is not slot aligned"
                )));
            }
            let capacity = size / SLOT_SIZE as u64 - 1;
            let occupied = read_header(&mut file)?;
            StoreMetadata::new(capacity, occupied)
        } else {
            let file = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&store_path)?;
            file.set_len(file_size(MIN_CAPACITY))?;
            StoreMetadata::new(MIN_CAPACITY, 0)
        };

        info!(
            path = %store_path.display(),
            capacity = meta.capacity(),
            occupied = meta.occupied(),
            "Using store"
        );

        let (resize_tx, resize_rx) = mpsc::channel(RESIZE_QUEUE_SIZE);
        let store = Arc::new(Self {
            store_path,
            temp_path,
            lock: Arc::new(RwLock::new(())),
            meta,
            resize_tx,
        });
        Ok((store, resize_rx))
    }

    /// The store's metadata.
    pub fn metadata(&self) -> &StoreMetadata {
        &self.meta
    }

    /// Dispatch one unary request, mapping engine errors onto wire statuses.
    pub async fn dispatch(&self, request: &Request) -> Response {
        debug!(%request, "Dispatching");
        match self.dispatch_inner(request).await {
            Ok(value) => Response::ok(request.id, value),
            Err(EngineError::NotFound) => {
                debug!(id = request.id, "Key not found");
                Response::with_status(request.id, EngineError::NotFound.status())
            }
            Err(e) => {
                warn!(error = %e, id = request.id, verb = %request.verb, "Request failed");
                Response::with_status(request.id, e.status())
            }
        }
    }

    async fn dispatch_inner(&self, request: &Request) -> EngineResult<Option<Value>> {
        match request.verb {
            Verb::Store => {
                let key = require_key(request)?;
                let value = request
                    .value
                    .clone()
                    .ok_or_else(|| EngineError::BadRequest("store requires a value".to_string()))?;

                let (payload, is_new) = {
                    let _guard = self.lock.write().await;
                    let mut file = self.open_read_write()?;
                    store_entry(&mut file, &self.meta, key, &value)?
                };
                if is_new && self.meta.load_ratio() > UP_RESIZE_LOAD {
                    self.enqueue_resize(self.meta.capacity() * 2);
                }
                Ok(Some(payload))
            }
            Verb::Add | Verb::Sub => {
                let key = require_key(request)?;
                let delta = match request.value {
                    Some(Value::Int(i)) => i,
                    Some(Value::Str(_)) => return Err(EngineError::TypeMismatch),
                    None => {
                        return Err(EngineError::BadRequest(
                            "arithmetic requires a value".to_string(),
                        ))
                    }
                };
                let _guard = self.lock.write().await;
                let mut file = self.open_read_write()?;
                arithmetic_entry(&mut file, &self.meta, key, delta, request.verb == Verb::Sub)
                    .map(Some)
            }
            Verb::Load => {
                let key = require_key(request)?;
                let _guard = self.lock.read().await;
                let mut file = self.open_read()?;
                load_entry(&mut file, &self.meta, key).map(Some)
            }
            Verb::Clear => {
                let key = require_key(request)?;
                {
                    let _guard = self.lock.write().await;
                    let mut file = self.open_read_write()?;
                    clear_entry(&mut file, &self.meta, key)?;
                }
                if self.meta.load_ratio() < DOWN_RESIZE_LOAD {
                    let target = (self.meta.capacity() / 2).max(MIN_CAPACITY);
                    if target < self.meta.capacity() {
                        self.enqueue_resize(target);
                    }
                }
                Ok(None)
            }
            Verb::ClearAll => {
                let _guard = self.lock.write().await;
                let mut file = self.open_read_write()?;
                clear_all(&mut file, &self.meta)?;
                Ok(None)
            }
            Verb::Count => {
                let _guard = self.lock.read().await;
                Ok(Some(Value::Int(clamp_i32(self.meta.occupied()))))
            }
            Verb::Size => {
                let _guard = self.lock.read().await;
                Ok(Some(Value::Int(clamp_i32(self.meta.size_bytes()))))
            }
            Verb::Space => {
                let key = require_key(request)?;
                let _guard = self.lock.read().await;
                match key {
                    "current" => Ok(Some(Value::Int(clamp_i32(self.meta.capacity())))),
                    "empty" => Ok(Some(Value::Int(clamp_i32(
                        self.meta.capacity() - self.meta.occupied(),
                    )))),
                    other => Err(EngineError::BadRequest(format!(
                        "unknown space argument: {other}"
                    ))),
                }
            }
            Verb::Resize => {
                let target = match request.value {
                    Some(Value::Int(i)) if i > 0 => i as u64,
                    Some(Value::Int(i)) => {
                        return Err(EngineError::ResizeRejected(format!(
                            "target {i} must be positive"
                        )))
                    }
                    _ => {
                        return Err(EngineError::BadRequest(
                            "resize requires an integer target".to_string(),
                        ))
                    }
                };
                self.resize(target).await?;
                Ok(None)
            }
            Verb::Exit => Ok(None),
            Verb::Keys | Verb::Values | Verb::Items => Err(EngineError::BadRequest(
                "stream verb on the unary path".to_string(),
            )),
        }
    }

    /// Dispatch a stream request. The returned channel yields Ok frames and
    /// NotFound markers for unset slots (the server filters the latter) and
    /// closes once every worker has exited.
    pub async fn dispatch_stream(&self, request: &Request) -> mpsc::Receiver<Response> {
        debug!(%request, "Dispatching stream");
        let (tx, rx) = mpsc::channel(STREAM_BUFFER_SIZE);

        let projection = match Projection::from_verb(request.verb) {
            Some(projection) => projection,
            None => {
                let _ = tx
                    .send(Response::with_status(
                        request.id,
                        getit_protocol::Status::InvalidRequest,
                    ))
                    .await;
                return rx;
            }
        };

        let guard = self.lock.clone().read_owned().await;
        let token = CancellationToken::new();
        let next_index = Arc::new(AtomicU64::new(1));
        let size_bytes = self.meta.size_bytes();

        let mut handles = Vec::with_capacity(STREAM_WORKER_COUNT);
        for _ in 0..STREAM_WORKER_COUNT {
            handles.push(spawn_worker(
                self.store_path.clone(),
                size_bytes,
                projection,
                request.id,
                tx.clone(),
                token.clone(),
                next_index.clone(),
            ));
        }
        drop(tx);

        // Hold the reader guard until the last worker is done, then let the
        // channel close.
        tokio::spawn(async move {
            for handle in handles {
                let _ = handle.await;
            }
            drop(guard);
        });

        rx
    }

    /// Rebuild the table at the target capacity and swap it in.
    ///
    /// Holds the shared lock for the scan and copy, and the exclusive lock
    /// only around the file rename.
    pub async fn resize(&self, target: u64) -> EngineResult<()> {
        if target == 0 {
            return Err(EngineError::ResizeRejected(
                "target must be positive".to_string(),
            ));
        }
        let occupied = self.meta.occupied();
        if occupied as f64 / target as f64 > UP_RESIZE_LOAD {
            return Err(EngineError::ResizeRejected(format!(
                "{occupied} occupied slots exceed the load threshold at capacity {target}"
            )));
        }

        let capacity = self.meta.capacity();
        {
            let _guard = self.lock.read().await;
            rebuild_into_temp(
                self.store_path.clone(),
                &self.temp_path,
                capacity,
                occupied,
                target,
            )
            .await?;
        }
        {
            let _guard = self.lock.write().await;
            std::fs::rename(&self.temp_path, &self.store_path)?;
            self.meta.apply_resize(target);
        }

        info!(from = capacity, to = target, "Resized store");
        Ok(())
    }

    /// Drain the resize queue, applying one resize at a time. Failures are
    /// logged; the next trigger retries.
    pub async fn run_resize_queue(self: Arc<Self>, mut requests: mpsc::Receiver<u64>) {
        while let Some(target) = requests.recv().await {
            debug!(target, "Processing queued resize");
            if let Err(e) = self.resize(target).await {
                warn!(error = %e, target, "Queued resize failed");
            }
        }
    }

    fn enqueue_resize(&self, target: u64) {
        if self.resize_tx.try_send(target).is_err() {
            debug!(target, "Resize queue full; trigger dropped");
        }
    }

    fn open_read(&self) -> EngineResult<File> {
        Ok(File::open(&self.store_path)?)
    }

    fn open_read_write(&self) -> EngineResult<File> {
        Ok(OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.store_path)?)
    }
}

fn require_key(request: &Request) -> EngineResult<&str> {
    request
        .key
        .as_deref()
        .ok_or_else(|| EngineError::BadRequest(format!("{} requires a key", request.verb)))
}

fn clamp_i32(v: u64) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}
