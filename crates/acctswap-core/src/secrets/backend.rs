//! Credential backend adapter
//!
//! The switch protocol only ever asks for five things: the live secret, and
//! get/set/delete of one account's backed-up secret. `SlotCredentials`
//! answers them with two `SecretStore`s, one holding the host's live entry
//! and one holding the per-account backups.

use std::sync::Arc;

use super::file_store::FileSecretStore;
use super::keychain_store::KeychainSecretStore;
use super::traits::{SecretStore, SecretStoreError, SecretStoreResult};
use crate::config::{ResolvedBackend, Settings};
use crate::registry::AccountId;
use crate::store::BackupLayout;
use crate::validation::{validate_account_id, validate_email};

/// Platform secret storage as seen by the switch protocol
///
/// Every method taking an id and email validates both before a key or file
/// name is derived from them.
pub trait CredentialBackend: Send + Sync {
    /// Human-readable backend name
    fn name(&self) -> &str;

    /// The secret the host application is currently using
    fn get_active(&self) -> SecretStoreResult<Option<String>>;

    /// Replace the host application's secret
    fn set_active(&self, secret: &str) -> SecretStoreResult<()>;

    fn get_backup(&self, id: AccountId, email: &str) -> SecretStoreResult<Option<String>>;

    fn set_backup(&self, id: AccountId, email: &str, secret: &str) -> SecretStoreResult<()>;

    fn delete_backup(&self, id: AccountId, email: &str) -> SecretStoreResult<()>;
}

/// `CredentialBackend` over an active-slot store and a backup store
pub struct SlotCredentials {
    active: Arc<dyn SecretStore>,
    active_key: String,
    backups: Arc<dyn SecretStore>,
    backup_prefix: String,
    backup_suffix: String,
}

impl SlotCredentials {
    /// Backups are keyed `account-<id>-<email>`
    pub fn new(
        active: Arc<dyn SecretStore>,
        active_key: impl Into<String>,
        backups: Arc<dyn SecretStore>,
    ) -> Self {
        Self {
            active,
            active_key: active_key.into(),
            backups,
            backup_prefix: "account-".to_string(),
            backup_suffix: String::new(),
        }
    }

    /// Change the backup key to `<prefix><id>-<email><suffix>`
    pub fn with_backup_naming(
        mut self,
        prefix: impl Into<String>,
        suffix: impl Into<String>,
    ) -> Self {
        self.backup_prefix = prefix.into();
        self.backup_suffix = suffix.into();
        self
    }

    /// Build the backend selected in `settings`
    pub fn from_settings(settings: &Settings, layout: &BackupLayout) -> SecretStoreResult<Self> {
        match settings.credential_backend.resolve() {
            ResolvedBackend::Keychain => {
                let active = KeychainSecretStore::with_service(settings.keychain_service.clone());
                let backups = KeychainSecretStore::with_service(settings.backup_service.clone());
                if !backups.is_available() {
                    return Err(SecretStoreError::NotAvailable(
                        "system keychain".to_string(),
                    ));
                }
                Ok(Self::new(
                    Arc::new(active),
                    settings.keychain_account(),
                    Arc::new(backups),
                ))
            }
            ResolvedBackend::File => {
                let live_path = settings.active_credentials_path();
                let (dir, file_name) = match (live_path.parent(), live_path.file_name()) {
                    (Some(dir), Some(name)) => {
                        (dir.to_path_buf(), name.to_string_lossy().into_owned())
                    }
                    _ => {
                        return Err(SecretStoreError::InvalidKey(
                            live_path.display().to_string(),
                        ))
                    }
                };
                Ok(Self::new(
                    Arc::new(FileSecretStore::new(dir)),
                    file_name,
                    Arc::new(FileSecretStore::new(layout.credentials_dir())),
                )
                .with_backup_naming("credentials-", ".json"))
            }
        }
    }

    /// Deterministic backup key for an account
    pub fn backup_key(&self, id: AccountId, email: &str) -> SecretStoreResult<String> {
        validate_account_id(id)?;
        validate_email(email)?;
        Ok(format!(
            "{}{}-{}{}",
            self.backup_prefix, id, email, self.backup_suffix
        ))
    }
}

impl CredentialBackend for SlotCredentials {
    fn name(&self) -> &str {
        self.backups.name()
    }

    fn get_active(&self) -> SecretStoreResult<Option<String>> {
        self.active.get(&self.active_key)
    }

    fn set_active(&self, secret: &str) -> SecretStoreResult<()> {
        self.active.store(&self.active_key, secret)
    }

    fn get_backup(&self, id: AccountId, email: &str) -> SecretStoreResult<Option<String>> {
        let key = self.backup_key(id, email)?;
        self.backups.get(&key)
    }

    fn set_backup(&self, id: AccountId, email: &str, secret: &str) -> SecretStoreResult<()> {
        let key = self.backup_key(id, email)?;
        self.backups.store(&key, secret)
    }

    fn delete_backup(&self, id: AccountId, email: &str) -> SecretStoreResult<()> {
        let key = self.backup_key(id, email)?;
        self.backups.delete(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendKind;
    use crate::secrets::MemorySecretStore;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn memory_slots() -> (Arc<MemorySecretStore>, Arc<MemorySecretStore>, SlotCredentials) {
        let active = Arc::new(MemorySecretStore::new());
        let backups = Arc::new(MemorySecretStore::new());
        let slots = SlotCredentials::new(active.clone(), "live", backups.clone());
        (active, backups, slots)
    }

    #[test]
    fn test_active_slot() {
        let (active, _, slots) = memory_slots();
        assert_eq!(slots.get_active().unwrap(), None);

        slots.set_active("token-a").unwrap();
        assert_eq!(active.get("live").unwrap().as_deref(), Some("token-a"));
        assert_eq!(slots.get_active().unwrap().as_deref(), Some("token-a"));
    }

    #[test]
    fn test_backup_keys() {
        let (_, backups, slots) = memory_slots();

        slots.set_backup(2, "a@b.com", "secret").unwrap();
        assert_eq!(backups.keys(), vec!["account-2-a@b.com".to_string()]);
        assert_eq!(slots.get_backup(2, "a@b.com").unwrap().as_deref(), Some("secret"));

        slots.delete_backup(2, "a@b.com").unwrap();
        assert!(backups.is_empty());
    }

    #[test]
    fn test_unsafe_inputs_never_reach_storage() {
        let (_, backups, slots) = memory_slots();

        assert!(matches!(
            slots.set_backup(1, "../../etc/x@y.com", "s"),
            Err(SecretStoreError::Validation(_))
        ));
        assert!(slots.set_backup(0, "a@b.com", "s").is_err());
        assert!(slots.get_backup(1, "not-an-email").is_err());
        assert!(slots.delete_backup(1, "a b@c.com").is_err());
        assert!(backups.is_empty());
    }

    #[test]
    fn test_file_backend_from_settings() {
        let dir = tempdir().unwrap();
        let settings = Settings {
            backup_root: Some(dir.path().join("backup")),
            active_credentials_file: Some(dir.path().join("host").join(".credentials.json")),
            credential_backend: BackendKind::File,
            ..Settings::default()
        };
        let layout = settings.layout();
        let slots = SlotCredentials::from_settings(&settings, &layout).unwrap();

        slots.set_active("{\"live\":true}").unwrap();
        slots.set_backup(1, "a@b.com", "{\"saved\":true}").unwrap();

        assert!(dir.path().join("host").join(".credentials.json").is_file());
        let backup: PathBuf = layout.credentials_dir().join("credentials-1-a@b.com.json");
        assert!(backup.is_file());
        assert_eq!(slots.name(), "file");
    }
}
