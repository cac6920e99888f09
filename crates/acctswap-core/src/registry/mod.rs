//! Account registry
//!
//! The in-memory model of `registry.json` and the pure operations over it.
//! Every operation borrows the current value and returns a new one, so the
//! rules can be tested without touching the disk; persisting the result is
//! the caller's job.

mod types;
mod ops;
mod error;

pub use types::{Account, AccountId, NewAccount, Registry};
pub use error::{RegistryError, RegistryResult};
