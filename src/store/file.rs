//! JSON-file seen store with atomic replace and a cross-process write lock.
//!
//! The set is written to a temp file and renamed over the store file, so a
//! reader sees either the old or the new set, never a partial one. Writers
//! serialize on an in-process mutex plus a `create_new` lock file next to
//! the store, and re-read the file before merging.

use super::{SeenIds, SeenStore};
use crate::error::{AlertError, Result};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

/// How long a writer waits for the lock file before giving up.
const LOCK_TIMEOUT: Duration = Duration::from_millis(1500);

/// Lock files older than this are assumed abandoned by a dead process.
const STALE_LOCK_AGE: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SeenStoreState {
    #[serde(default = "default_state_version")]
    version: u8,
    #[serde(default)]
    ids: SeenIds,
}

fn default_state_version() -> u8 {
    1
}

/// File-backed [`SeenStore`].
#[derive(Debug)]
pub struct FileSeenStore {
    path: PathBuf,
    capacity: usize,
    write_lock: Mutex<()>,
}

impl FileSeenStore {
    /// Create a store bound to `path` with the default capacity.
    ///
    /// The file is created lazily on the first write.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self::with_capacity(path, super::MAX_SEEN)
    }

    /// Create a store bound to `path` retaining at most `capacity` identities.
    #[must_use]
    pub fn with_capacity(path: PathBuf, capacity: usize) -> Self {
        Self {
            path,
            capacity: capacity.max(1),
            write_lock: Mutex::new(()),
        }
    }

    /// Location of the store file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the store file. Missing files are not an error.
    pub fn clear(&self) -> Result<()> {
        let _local = self.write_lock.lock().map_err(poisoned)?;
        let _guard = self.acquire_lock_file(LOCK_TIMEOUT)?;
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AlertError::Persistence(format!(
                "cannot delete seen store: {e}"
            ))),
        }
    }

    fn read_ids(&self) -> Result<SeenIds> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(SeenIds::new()),
            Err(e) => {
                return Err(AlertError::Persistence(format!(
                    "cannot read seen store {}: {e}",
                    self.path.display()
                )));
            }
        };

        match serde_json::from_slice::<SeenStoreState>(&bytes) {
            Ok(state) => Ok(state.ids),
            Err(e) => {
                warn!(
                    "ignoring malformed seen store at {}: {e}",
                    self.path.display()
                );
                Ok(SeenIds::new())
            }
        }
    }

    fn write_ids(&self, mut ids: SeenIds) -> Result<SeenIds> {
        ids.trim_to(self.capacity);

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AlertError::Persistence(format!("cannot create seen store directory: {e}"))
            })?;
        }

        let state = SeenStoreState {
            version: default_state_version(),
            ids,
        };
        let json = serde_json::to_vec_pretty(&state)
            .map_err(|e| AlertError::Persistence(format!("cannot serialize seen store: {e}")))?;

        let tmp_path = self.path.with_extension("tmp");
        std::fs::write(&tmp_path, json).map_err(|e| {
            AlertError::Persistence(format!("cannot write seen store temp file: {e}"))
        })?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| {
            AlertError::Persistence(format!("cannot finalize seen store file: {e}"))
        })?;

        debug!(
            path = %self.path.display(),
            count = state.ids.len(),
            "seen store written"
        );
        Ok(state.ids)
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn acquire_lock_file(&self, timeout: Duration) -> Result<LockFileGuard> {
        let lock_path = self.lock_path();
        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AlertError::Persistence(format!("cannot create seen store lock directory: {e}"))
            })?;
        }

        let started = std::time::Instant::now();
        loop {
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&lock_path)
            {
                Ok(mut file) => {
                    let _ = write!(file, "{}", std::process::id());
                    return Ok(LockFileGuard { path: lock_path });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    evict_stale_lock(&lock_path);
                    if started.elapsed() > timeout {
                        return Err(AlertError::Persistence(format!(
                            "timed out waiting for seen store lock {}",
                            lock_path.display()
                        )));
                    }
                    std::thread::sleep(Duration::from_millis(2));
                }
                Err(e) => {
                    return Err(AlertError::Persistence(format!(
                        "cannot create seen store lock {}: {e}",
                        lock_path.display()
                    )));
                }
            }
        }
    }
}

fn evict_stale_lock(lock_path: &Path) {
    let age = std::fs::metadata(lock_path)
        .and_then(|metadata| metadata.modified())
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok());

    if age.is_some_and(|age| age > STALE_LOCK_AGE) {
        warn!("removing stale seen store lock {}", lock_path.display());
        let _ = std::fs::remove_file(lock_path);
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> AlertError {
    AlertError::Persistence(format!("seen store lock poisoned: {e}"))
}

struct LockFileGuard {
    path: PathBuf,
}

impl Drop for LockFileGuard {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

impl SeenStore for FileSeenStore {
    fn get(&self) -> Result<SeenIds> {
        self.read_ids()
    }

    fn update(&self, ids: SeenIds) -> Result<()> {
        let _local = self.write_lock.lock().map_err(poisoned)?;
        let _guard = self.acquire_lock_file(LOCK_TIMEOUT)?;
        self.write_ids(ids)?;
        Ok(())
    }

    fn commit(&self, new_ids: &[String]) -> Result<SeenIds> {
        let _local = self.write_lock.lock().map_err(poisoned)?;
        let _guard = self.acquire_lock_file(LOCK_TIMEOUT)?;
        let current = self.read_ids()?;
        self.write_ids(current.union(new_ids.iter().cloned()))
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}
