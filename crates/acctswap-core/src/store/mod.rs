//! Corruption-safe persistence
//!
//! - `atomic`: temp-file + rename writes of JSON documents and raw blobs
//! - `lock`: the advisory cross-process lock taken by mutating commands
//! - `backups`: per-account configuration blobs
//! - `layout`: where everything lives under the backup root

mod error;
mod atomic;
mod lock;
mod process;
mod backups;
mod layout;

pub use error::{StoreError, StoreResult};
pub use atomic::{
    ensure_private_dir, read_document, read_optional, write_atomic, write_bytes_atomic, write_new,
};
pub use lock::{acquire_lock, release_lock, LockGuard, LockOwner};
pub use process::is_process_alive;
pub use backups::ConfigBackups;
pub use layout::BackupLayout;
