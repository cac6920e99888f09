//! Core traits and types for secret storage

use thiserror::Error;

use crate::store::StoreError;
use crate::validation::ValidationError;

/// Errors that can occur during secret store operations
#[derive(Error, Debug)]
pub enum SecretStoreError {
    #[error("Store not available: {0}")]
    NotAvailable(String),

    #[error("Invalid secret key: {0:?}")]
    InvalidKey(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Store error: {0}")]
    Other(String),
}

pub type SecretStoreResult<T> = Result<T, SecretStoreError>;

/// Trait for secret storage implementations
///
/// Implementations:
/// - System keychain (`KeychainSecretStore`)
/// - Owner-only files (`FileSecretStore`)
/// - In-memory for testing (`MemorySecretStore`)
///
/// A missing secret is `Ok(None)`; `Err` means the backend could not answer.
pub trait SecretStore: Send + Sync {
    /// Human-readable name of this store
    fn name(&self) -> &str;

    /// Check if this store is available
    ///
    /// For example, a keychain store might not be available on a headless server.
    fn is_available(&self) -> bool {
        true
    }

    /// Retrieve a secret by key
    fn get(&self, key: &str) -> SecretStoreResult<Option<String>>;

    /// Store a secret, replacing any previous value
    fn store(&self, key: &str, value: &str) -> SecretStoreResult<()>;

    /// Delete a secret; deleting a missing key succeeds
    fn delete(&self, key: &str) -> SecretStoreResult<()>;

    /// Check if a secret exists
    fn has(&self, key: &str) -> SecretStoreResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}
