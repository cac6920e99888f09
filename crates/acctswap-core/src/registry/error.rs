//! Registry error types

use thiserror::Error;

use super::types::AccountId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("No account with id {0}")]
    AccountNotFound(AccountId),

    #[error("Alias '{alias}' is already in use by {label}")]
    AliasInUse { alias: String, label: String },

    #[error("No active account")]
    NoActiveAccount,

    #[error("At least two accounts are needed to rotate")]
    TooFewAccounts,

    #[error("No account ids left; remove the account with the highest id first")]
    IdsExhausted,

    #[error("Registry is inconsistent: {0}")]
    Inconsistent(String),
}

pub type RegistryResult<T> = Result<T, RegistryError>;
