//! Crate-level error type
//!
//! Each module has its own error enum; `Error` gathers them so the command
//! layer can use `?` throughout, and `kind()` tells the binary how to present
//! a failure.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::registry::RegistryError;
use crate::secrets::SecretStoreError;
use crate::store::StoreError;
use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    NotFound(String),

    #[error("{email} is already managed as {label}")]
    AlreadyManaged { email: String, label: String },

    #[error("Missing backup data for {label}; log in to that account and add it again")]
    MissingBackup { label: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Secret(#[from] SecretStoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Prompt failed: {0}")]
    Prompt(#[from] io::Error),
}

/// How a failure should be reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input; nothing was changed
    Validation,
    /// Unknown identifier, account or alias; nothing was changed
    NotFound,
    /// Another instance holds the lock
    LockHeld,
    /// The switch target has no usable backup
    MissingBackup,
    /// Read, write or parse failure
    Io,
}

impl Error {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) | Error::AlreadyManaged { .. } => ErrorKind::Validation,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::MissingBackup { .. } => ErrorKind::MissingBackup,
            Error::Registry(e) => match e {
                RegistryError::AccountNotFound(_) => ErrorKind::NotFound,
                RegistryError::AliasInUse { .. }
                | RegistryError::NoActiveAccount
                | RegistryError::TooFewAccounts
                | RegistryError::IdsExhausted => ErrorKind::Validation,
                RegistryError::Inconsistent(_) => ErrorKind::Io,
            },
            Error::Store(StoreError::LockHeld { .. }) => ErrorKind::LockHeld,
            Error::Secret(SecretStoreError::Validation(_)) => ErrorKind::Validation,
            Error::Store(_) | Error::Secret(_) | Error::Config(_) | Error::Prompt(_) => {
                ErrorKind::Io
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_kinds() {
        let lock = Error::from(StoreError::LockHeld {
            path: PathBuf::from("/tmp/.lock"),
        });
        assert_eq!(lock.kind(), ErrorKind::LockHeld);

        let alias = Error::from(ValidationError::ReservedAlias("list".to_string()));
        assert_eq!(alias.kind(), ErrorKind::Validation);

        assert_eq!(
            Error::from(RegistryError::AccountNotFound(3)).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            Error::MissingBackup { label: "Account-2".to_string() }.kind(),
            ErrorKind::MissingBackup
        );
        assert_eq!(
            Error::from(SecretStoreError::Other("boom".to_string())).kind(),
            ErrorKind::Io
        );
    }

    #[test]
    fn test_messages_are_single_line() {
        let err = Error::MissingBackup {
            label: "Account-2".to_string(),
        };
        assert!(err.to_string().contains("Account-2"));
        assert!(!err.to_string().contains('\n'));
    }
}
