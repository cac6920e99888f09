//! Persistence error types

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while reading, writing or locking persisted state
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize {}: {source}", .path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialized document for {} does not round-trip", .path.display())]
    RoundTrip { path: PathBuf },

    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Corrupt document {}: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error(
        "Another instance is running (lock held at {}). If you are sure no other instance is running, remove it with: rm -rf {}",
        .path.display(),
        .path.display()
    )]
    LockHeld { path: PathBuf },
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn corrupt(path: &Path, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    /// The file or directory the error is about
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. }
            | Self::Serialize { path, .. }
            | Self::RoundTrip { path }
            | Self::Parse { path, .. }
            | Self::Corrupt { path, .. }
            | Self::LockHeld { path } => path,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
