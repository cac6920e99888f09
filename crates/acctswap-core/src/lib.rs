//! acctswap core
//!
//! Manage several logins of a host application on one machine and swap the
//! active one. This crate holds everything except the terminal front end:
//!
//! - `registry`: the account list, as pure value transformations
//! - `store`: atomic JSON persistence, the cross-process lock and backups
//! - `secrets`: secret stores and the credential backend built on them
//! - `config`: user settings and access to the host application's config
//! - `switch`: the backup-then-restore protocol
//! - `manager`: locked commands tying the above together
//!
//! ```rust,ignore
//! use acctswap_core::{AccountManager, ConsoleLogger, Settings};
//!
//! let settings = Settings::load()?;
//! let manager = AccountManager::from_settings(&settings, Arc::new(ConsoleLogger::new()))?;
//!
//! manager.add_current(Some("work")).await?;
//! manager.next().await?;
//! ```

pub mod logging;
pub mod validation;
pub mod store;
pub mod registry;
pub mod secrets;
pub mod config;
pub mod switch;
pub mod manager;
mod error;

pub use error::{Error, ErrorKind, Result};

pub use logging::{Logger, SharedLogger, NoOpLogger, ConsoleLogger};

pub use registry::{Account, AccountId, NewAccount, Registry, RegistryError};

pub use store::{BackupLayout, ConfigBackups, LockGuard, StoreError};

pub use secrets::{
    CredentialBackend, SlotCredentials,
    SecretStore, SecretStoreError, SecretStoreResult,
    FileSecretStore, KeychainSecretStore, MemorySecretStore,
};

pub use config::{
    BackendKind, FileHostConfig, HostConfig, Identity, MemoryHostConfig, ResolvedBackend, Settings,
};

pub use switch::{AccountRef, SwitchOutcome, SwitchProtocol};

pub use manager::{AccountManager, AccountSummary, Picker, RemoveReport, Selection, StatusReport};
