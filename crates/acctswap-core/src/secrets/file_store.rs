//! Owner-only file secret store
//!
//! Used where the host application keeps its credentials in a plain file
//! (Linux, WSL) and for credential backups on those platforms.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::traits::{SecretStore, SecretStoreError, SecretStoreResult};
use crate::logging::file_logger as log;
use crate::store::{write_bytes_atomic, StoreError};

/// One file per key inside `dir`, written atomically with mode 0600
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    dir: PathBuf,
}

impl FileSecretStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Keys are bare file names; anything that could escape `dir` is refused
    fn path_for(&self, key: &str) -> SecretStoreResult<PathBuf> {
        let escapes = key.is_empty()
            || key == "."
            || key == ".."
            || key.contains(['/', '\\', '\0']);
        if escapes {
            return Err(SecretStoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(key))
    }
}

impl SecretStore for FileSecretStore {
    fn name(&self) -> &str {
        "file"
    }

    fn get(&self, key: &str) -> SecretStoreResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => {
                log::debug("FileSecretStore", &format!("get({key}) len={}", value.len()));
                Ok(Some(value))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io { path, source: e }.into()),
        }
    }

    fn store(&self, key: &str, value: &str) -> SecretStoreResult<()> {
        let path = self.path_for(key)?;
        log::debug("FileSecretStore", &format!("store({key}) len={}", value.len()));
        write_bytes_atomic(&path, value.as_bytes())?;
        Ok(())
    }

    fn delete(&self, key: &str) -> SecretStoreResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io { path, source: e }.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_store_crud() {
        let dir = tempdir().unwrap();
        let store = FileSecretStore::new(dir.path().join("credentials"));

        assert_eq!(store.get("credentials-1-a@b.com.json").unwrap(), None);
        store.store("credentials-1-a@b.com.json", "{\"token\":1}").unwrap();
        assert_eq!(
            store.get("credentials-1-a@b.com.json").unwrap().as_deref(),
            Some("{\"token\":1}")
        );

        store.delete("credentials-1-a@b.com.json").unwrap();
        store.delete("credentials-1-a@b.com.json").unwrap();
        assert!(!store.has("credentials-1-a@b.com.json").unwrap());
    }

    #[test]
    fn test_file_store_rejects_escaping_keys() {
        let dir = tempdir().unwrap();
        let store = FileSecretStore::new(dir.path());

        for key in ["", ".", "..", "../x", "a/b", "a\\b"] {
            assert!(
                matches!(store.store(key, "v"), Err(SecretStoreError::InvalidKey(_))),
                "{key:?}"
            );
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let store = FileSecretStore::new(dir.path());
        store.store(".credentials.json", "secret").unwrap();

        let mode = fs::metadata(dir.path().join(".credentials.json"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
