//! Advisory lock shared by every mutating command
//!
//! The lock is a directory created with `mkdir`, which either succeeds or
//! fails atomically. Inside it `owner.json` records who holds it so that a
//! lock left behind by a crashed process can be told apart from a live one.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::atomic::{ensure_private_dir, read_document, write_atomic};
use super::error::{StoreError, StoreResult};
use super::process::is_process_alive;
use crate::logging::file_logger as log;

const OWNER_FILE: &str = "owner.json";

/// Owner record written into the lock directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockOwner {
    pub pid: u32,
    pub started_at: DateTime<Utc>,
}

impl LockOwner {
    /// Owner record for the running process
    pub fn current() -> Self {
        Self {
            pid: std::process::id(),
            started_at: Utc::now(),
        }
    }
}

/// Held lock; released when dropped
#[derive(Debug)]
pub struct LockGuard {
    path: PathBuf,
    released: bool,
}

impl LockGuard {
    /// Path of the lock directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release explicitly, surfacing any error instead of swallowing it in `Drop`
    pub fn release(mut self) -> StoreResult<()> {
        self.released = true;
        release_lock(&self.path)
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if !self.released {
            if let Err(e) = release_lock(&self.path) {
                log::warn("lock", &format!("failed to release {}: {}", self.path.display(), e));
            }
        }
    }
}

/// Take the lock at `lock_path`.
///
/// If the lock exists and its recorded owner is no longer running, the stale
/// lock is taken over and acquisition is retried once. Otherwise fails with
/// `StoreError::LockHeld`.
pub fn acquire_lock(lock_path: &Path) -> StoreResult<LockGuard> {
    acquire_as(lock_path, &LockOwner::current())
}

fn acquire_as(lock_path: &Path, owner: &LockOwner) -> StoreResult<LockGuard> {
    if try_create(lock_path, owner)? {
        return Ok(guard(lock_path));
    }
    match stale_owner(lock_path) {
        Some(stale) => take_over(lock_path, &stale, owner),
        None => Err(held(lock_path)),
    }
}

/// Replace a lock whose owner `stale` has died.
///
/// The stale directory is renamed to a unique tombstone before anything is
/// deleted. Only one contender can win that rename, and the owner record is
/// checked again inside the tombstone, so a lock that was re-taken in the
/// meantime is put back instead of removed.
fn take_over(lock_path: &Path, stale: &LockOwner, owner: &LockOwner) -> StoreResult<LockGuard> {
    if recorded_owner(lock_path).as_ref() != Some(stale) {
        return Err(held(lock_path));
    }
    if let Some(tombstone) = bury(lock_path, stale)? {
        log::warn(
            "lock",
            &format!(
                "removing stale lock {} (pid {} since {})",
                lock_path.display(),
                stale.pid,
                stale.started_at
            ),
        );
        release_lock(&tombstone)?;
    }
    if try_create(lock_path, owner)? {
        Ok(guard(lock_path))
    } else {
        Err(held(lock_path))
    }
}

/// Move the lock aside if it still belongs to `stale`.
///
/// Returns the tombstone path when this call moved the stale lock, `None`
/// when the lock was already gone. A lock owned by anyone else is moved back
/// and reported as held.
fn bury(lock_path: &Path, stale: &LockOwner) -> StoreResult<Option<PathBuf>> {
    let tombstone = tombstone_path(lock_path);
    match fs::rename(lock_path, &tombstone) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::io(lock_path, e)),
    }
    if recorded_owner(&tombstone).as_ref() == Some(stale) {
        return Ok(Some(tombstone));
    }
    if let Err(e) = fs::rename(&tombstone, lock_path) {
        log::error(
            "lock",
            &format!(
                "failed to restore {} from {}: {}",
                lock_path.display(),
                tombstone.display(),
                e
            ),
        );
    }
    Err(held(lock_path))
}

fn tombstone_path(lock_path: &Path) -> PathBuf {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let mut name = lock_path.as_os_str().to_owned();
    name.push(format!(".stale-{}-{}", std::process::id(), nanos));
    PathBuf::from(name)
}

fn held(lock_path: &Path) -> StoreError {
    StoreError::LockHeld {
        path: lock_path.to_path_buf(),
    }
}

/// Remove the lock. A missing lock is not an error.
pub fn release_lock(lock_path: &Path) -> StoreResult<()> {
    match fs::remove_dir_all(lock_path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StoreError::io(lock_path, e)),
    }
}

fn guard(lock_path: &Path) -> LockGuard {
    log::debug("lock", &format!("acquired {}", lock_path.display()));
    LockGuard {
        path: lock_path.to_path_buf(),
        released: false,
    }
}

fn try_create(lock_path: &Path, owner: &LockOwner) -> StoreResult<bool> {
    if let Some(parent) = lock_path.parent() {
        ensure_private_dir(parent)?;
    }
    match fs::create_dir(lock_path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(StoreError::io(lock_path, e)),
    }
    if let Err(e) = write_atomic(&lock_path.join(OWNER_FILE), owner) {
        let _ = fs::remove_dir_all(lock_path);
        return Err(e);
    }
    Ok(true)
}

/// The recorded owner, if it is provably gone.
///
/// An unreadable owner record may belong to a holder that has not finished
/// writing it yet, so it never counts as stale.
fn stale_owner(lock_path: &Path) -> Option<LockOwner> {
    let owner = recorded_owner(lock_path)?;
    if is_process_alive(owner.pid) {
        None
    } else {
        Some(owner)
    }
}

fn recorded_owner(lock_path: &Path) -> Option<LockOwner> {
    read_document(&lock_path.join(OWNER_FILE)).ok()
}
