//! Registry data model

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable internal id, assigned once and never renumbered
pub type AccountId = u32;

/// A managed account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub email: String,
    /// Opaque identifier the host application uses for this account
    pub external_id: String,
    pub added_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

/// The persisted registry document
///
/// `order` defines the user-facing position of each account (index + 1);
/// `accounts` is keyed by internal id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registry {
    #[serde(default)]
    pub active_account_id: Option<AccountId>,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub order: Vec<AccountId>,
    #[serde(default)]
    pub accounts: BTreeMap<AccountId, Account>,
}

/// Input to `Registry::add`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub email: String,
    pub external_id: String,
    pub alias: Option<String>,
}

impl NewAccount {
    pub fn new(email: impl Into<String>, external_id: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            external_id: external_id.into(),
            alias: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}
