//! Files and directories under the backup root

use std::path::{Path, PathBuf};

/// Everything this tool persists lives under one root:
///
/// ```text
/// <root>/registry.json
/// <root>/.lock/owner.json
/// <root>/configs/config-<id>-<email>.json
/// <root>/credentials/credentials-<id>-<email>.json   (file backend only)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupLayout {
    root: PathBuf,
}

impl BackupLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn registry_path(&self) -> PathBuf {
        self.root.join("registry.json")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join(".lock")
    }

    pub fn configs_dir(&self) -> PathBuf {
        self.root.join("configs")
    }

    pub fn credentials_dir(&self) -> PathBuf {
        self.root.join("credentials")
    }
}
