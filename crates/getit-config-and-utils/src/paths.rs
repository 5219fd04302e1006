//! File system paths for the store and its sidecar files.
//!
//! All files live next to the executable: the store itself as
//! `<store>.bin`, the resize scratch file as `<store>.temp.bin`, logs as
//! `<store>.log` (or `<store>.debug.log` in debug mode) and the optional
//! config file as `<store>.config.json`.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

/// Manages file system paths for a named store.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Directory holding the store and its sidecar files.
    base_dir: PathBuf,
    /// Store name (file stem for every sidecar file).
    store_name: String,
}

impl Paths {
    /// Create a new Paths instance rooted at the executable's directory.
    pub fn new(store_name: &str) -> CoreResult<Self> {
        let exe = std::env::current_exe()?;
        let base_dir = exe
            .parent()
            .ok_or_else(|| CoreError::Path("Could not determine executable directory".to_string()))?
            .to_path_buf();

        Ok(Self {
            base_dir,
            store_name: store_name.to_string(),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf, store_name: &str) -> Self {
        Self {
            base_dir,
            store_name: store_name.to_string(),
        }
    }

    /// Get the base directory.
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the store name.
    pub fn store_name(&self) -> &str {
        &self.store_name
    }

    /// Get the store file path (`<store>.bin`).
    pub fn store_file(&self) -> PathBuf {
        self.base_dir.join(format!("{}.bin", self.store_name))
    }

    /// Get the resize scratch file path (`<store>.temp.bin`).
    pub fn temp_file(&self) -> PathBuf {
        self.base_dir.join(format!("{}.temp.bin", self.store_name))
    }

    /// Get the log file path (`<store>.log`, or `<store>.debug.log` in debug mode).
    pub fn log_file(&self, debug: bool) -> PathBuf {
        let name = if debug {
            format!("{}.debug.log", self.store_name)
        } else {
            format!("{}.log", self.store_name)
        };
        self.base_dir.join(name)
    }

    /// Get the config file path (`<store>.config.json`).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir
            .join(format!("{}.config.json", self.store_name))
    }
}
