//! Per-account configuration backups

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::atomic::{read_optional, write_atomic};
use super::error::StoreError;
use crate::registry::AccountId;
use crate::validation::{validate_account_id, validate_email, ValidationResult};

/// Directory of configuration snapshots, one JSON document per account
#[derive(Debug, Clone)]
pub struct ConfigBackups {
    dir: PathBuf,
}

impl ConfigBackups {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Deterministic backup path for an account; rejects unsafe inputs
    pub fn path_for(&self, id: AccountId, email: &str) -> ValidationResult<PathBuf> {
        validate_account_id(id)?;
        validate_email(email)?;
        Ok(self.dir.join(format!("config-{id}-{email}.json")))
    }

    pub fn save(&self, id: AccountId, email: &str, config: &Value) -> crate::Result<()> {
        let path = self.path_for(id, email)?;
        write_atomic(&path, config)?;
        Ok(())
    }

    pub fn load(&self, id: AccountId, email: &str) -> crate::Result<Option<Value>> {
        let path = self.path_for(id, email)?;
        Ok(read_optional(&path)?)
    }

    /// Delete the backup; a missing file is fine
    pub fn delete(&self, id: AccountId, email: &str) -> crate::Result<()> {
        let path = self.path_for(id, email)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(&path, e).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_save_load_delete() {
        let dir = tempdir().unwrap();
        let backups = ConfigBackups::new(dir.path().join("configs"));
        let config = json!({"oauthAccount": {"emailAddress": "a@b.com"}, "theme": "dark"});

        backups.save(1, "a@b.com", &config).unwrap();
        assert_eq!(backups.load(1, "a@b.com").unwrap(), Some(config));
        assert!(dir.path().join("configs").join("config-1-a@b.com.json").exists());

        backups.delete(1, "a@b.com").unwrap();
        assert_eq!(backups.load(1, "a@b.com").unwrap(), None);
        backups.delete(1, "a@b.com").unwrap();
    }

    #[test]
    fn test_rejects_unsafe_names() {
        let dir = tempdir().unwrap();
        let backups = ConfigBackups::new(dir.path());

        assert!(backups.path_for(1, "../../x@y.com").is_err());
        assert!(backups.path_for(0, "a@b.com").is_err());
        assert!(backups.save(1, "a/b@c.com", &json!({})).is_err());
    }
}
