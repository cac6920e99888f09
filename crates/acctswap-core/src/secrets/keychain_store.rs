//! System keychain secret store
//!
//! Uses the OS keychain for secure secret storage:
//! - macOS: Keychain
//! - Windows: Credential Manager
//! - Linux: Secret Service (GNOME Keyring, KWallet)

use keyring::Entry;

use super::traits::{SecretStore, SecretStoreError, SecretStoreResult};
use crate::logging::file_logger as log;

/// Secret store backed by the system keychain
///
/// Each key becomes the account name of an entry under `service_name`.
///
/// # Example
///
/// ```no_run
/// use acctswap_core::secrets::{KeychainSecretStore, SecretStore};
///
/// let store = KeychainSecretStore::with_service("acctswap");
/// store.store("account-1-a@b.com", "{...}").unwrap();
/// assert!(store.has("account-1-a@b.com").unwrap());
/// ```
pub struct KeychainSecretStore {
    service_name: String,
}

impl KeychainSecretStore {
    /// Create a keychain store with the default service name "acctswap"
    pub fn new() -> Self {
        Self::with_service("acctswap")
    }

    /// Create a keychain store with a custom service name
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service_name: service.into(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service_name
    }

    fn entry(&self, key: &str) -> SecretStoreResult<Entry> {
        Entry::new(&self.service_name, key)
            .map_err(|e| SecretStoreError::Other(format!("Failed to create keychain entry: {}", e)))
    }
}

impl Default for KeychainSecretStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretStore for KeychainSecretStore {
    fn name(&self) -> &str {
        "keychain"
    }

    fn is_available(&self) -> bool {
        // Fails on headless machines without a keychain daemon
        match Entry::new(&self.service_name, "__acctswap_availability_check__") {
            Ok(_) => true,
            Err(e) => {
                log::warn(
                    "KeychainSecretStore",
                    &format!("is_available() = false, error: {:?}", e),
                );
                false
            }
        }
    }

    fn get(&self, key: &str) -> SecretStoreResult<Option<String>> {
        log::debug(
            "KeychainSecretStore",
            &format!("get() key='{}', service='{}'", key, self.service_name),
        );
        match self.entry(key)?.get_password() {
            Ok(password) => {
                log::debug("KeychainSecretStore", &format!("get() value len={}", password.len()));
                Ok(Some(password))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => {
                log::warn("KeychainSecretStore", &format!("get() error: {:?}", e));
                Err(SecretStoreError::Other(format!(
                    "Failed to read keychain entry '{}': {}",
                    key, e
                )))
            }
        }
    }

    fn store(&self, key: &str, value: &str) -> SecretStoreResult<()> {
        log::info(
            "KeychainSecretStore",
            &format!("store() key='{}', service='{}'", key, self.service_name),
        );

        self.entry(key)?.set_password(value).map_err(|e| {
            log::error("KeychainSecretStore", &format!("set_password failed: {:?}", e));
            SecretStoreError::Other(format!("Failed to store in keychain: {}", e))
        })?;

        // Read back through a fresh entry so a cached handle cannot mask a failed write
        match self.entry(key)?.get_password() {
            Ok(retrieved) if retrieved == value => Ok(()),
            Ok(other) => {
                log::error(
                    "KeychainSecretStore",
                    &format!(
                        "verification failed: expected len={}, got len={}",
                        value.len(),
                        other.len()
                    ),
                );
                Err(SecretStoreError::Other(
                    "Keychain store verification failed: value mismatch".to_string(),
                ))
            }
            Err(e) => Err(SecretStoreError::Other(format!(
                "Keychain store verification failed: could not read back: {}",
                e
            ))),
        }
    }

    fn delete(&self, key: &str) -> SecretStoreResult<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(SecretStoreError::Other(format!(
                "Failed to delete from keychain: {}",
                e
            ))),
        }
    }
}
