//! Secret storage and the credential backend adapter
//!
//! This module provides:
//! - `SecretStore` trait for key/value secret storage
//! - Implementations: `KeychainSecretStore`, `FileSecretStore`, `MemorySecretStore`
//! - `CredentialBackend`, the contract the switch protocol talks to, and
//!   `SlotCredentials`, which builds it from an active slot and a backup store

mod traits;
mod memory_store;
mod file_store;
mod keychain_store;
mod backend;

pub use traits::{SecretStore, SecretStoreError, SecretStoreResult};
pub use memory_store::MemorySecretStore;
pub use file_store::FileSecretStore;
pub use keychain_store::KeychainSecretStore;
pub use backend::{CredentialBackend, SlotCredentials};
