//! Snapshot Module
//!
//! Saves and restores the raw contents of a [`MemoryStorage`] as a JSON file.
//! Records keep their own expiry metadata, so stale records in a restored
//! snapshot still expire on first read.

use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::Result;
use crate::storage::MemoryStorage;

/// Writes every stored key/record pair to `path`.
///
/// The file is written to a uniquely named sibling temporary file first and
/// renamed into place, so a crash mid-write leaves the previous snapshot intact
/// and concurrent saves never share a temporary file.
pub fn save_snapshot(path: &Path, storage: &MemoryStorage) -> Result<usize> {
    let entries = storage.snapshot();
    let encoded = serde_json::to_string_pretty(&entries)?;

    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            fs::create_dir_all(parent)?;
            parent
        }
        None => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(encoded.as_bytes())?;
    tmp.persist(path).map_err(|e| e.error)?;

    debug!("Saved {} records to {}", entries.len(), path.display());
    Ok(entries.len())
}

// == Snapshot Writer ==
/// Saves one storage to one file, one save at a time.
///
/// Each save reads the storage while holding the lock, so the last save to
/// finish always carries the newest contents.
#[derive(Debug)]
pub struct SnapshotWriter {
    path: PathBuf,
    storage: Arc<MemoryStorage>,
    lock: Mutex<()>,
}

impl SnapshotWriter {
    pub fn new(path: PathBuf, storage: Arc<MemoryStorage>) -> Self {
        Self {
            path,
            storage,
            lock: Mutex::new(()),
        }
    }

    /// Returns the snapshot file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the snapshot, waiting for any save already in progress.
    pub fn save(&self) -> Result<usize> {
        let _guard = self.lock.lock();
        save_snapshot(&self.path, &self.storage)
    }
}

/// Reads a snapshot written by [`save_snapshot`].
///
/// A missing file yields an empty map.
pub fn load_snapshot(path: &Path) -> Result<HashMap<String, String>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!("No snapshot at {}, starting empty", path.display());
            return Ok(HashMap::new());
        }
        Err(e) => return Err(e.into()),
    };

    let entries: HashMap<String, String> = serde_json::from_str(&raw)?;
    info!("Loaded {} records from {}", entries.len(), path.display());
    Ok(entries)
}
