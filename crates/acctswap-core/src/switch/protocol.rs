//! Backup-then-restore swap of the active account

use std::path::Path;

use chrono::Utc;
use serde_json::Value;

use crate::config::{identity_section, merge_identity, HostConfig, Identity};
use crate::error::{Error, Result};
use crate::logging::Logger;
use crate::registry::{AccountId, Registry, RegistryError};
use crate::secrets::CredentialBackend;
use crate::store::{write_atomic, ConfigBackups};
use crate::validation::validate_email;

/// An account as shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRef {
    pub id: AccountId,
    pub label: String,
    pub email: String,
    pub alias: Option<String>,
}

impl AccountRef {
    pub fn of(registry: &Registry, id: AccountId) -> Option<Self> {
        let account = registry.account(id)?;
        Some(Self {
            id,
            label: registry.display_label(id),
            email: account.email.clone(),
            alias: account.alias.clone(),
        })
    }
}

impl std::fmt::Display for AccountRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.label, self.email)?;
        if let Some(alias) = &self.alias {
            write!(f, " [{}]", alias)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// The target was already active; nothing was touched
    AlreadyActive(AccountRef),
    /// Credentials and identity were swapped and the registry committed
    Switched {
        from: Option<AccountRef>,
        to: AccountRef,
    },
}

/// Everything the switch needs, borrowed from the caller
///
/// The caller must hold the registry lock for the duration of `run`.
pub struct SwitchProtocol<'a> {
    pub credentials: &'a dyn CredentialBackend,
    pub host: &'a dyn HostConfig,
    pub config_backups: &'a ConfigBackups,
    pub registry_path: &'a Path,
    pub identity_field: &'a str,
    pub logger: &'a dyn Logger,
}

impl SwitchProtocol<'_> {
    /// Make `target` the active account.
    ///
    /// Returns the committed registry alongside the outcome. The registry is
    /// written last, so any failure leaves `activeAccountId` where it was.
    pub async fn run(
        &self,
        registry: &Registry,
        target: AccountId,
    ) -> Result<(Registry, SwitchOutcome)> {
        let to = AccountRef::of(registry, target).ok_or(RegistryError::AccountNotFound(target))?;

        if registry.active_account_id == Some(target) {
            return Ok((registry.clone(), SwitchOutcome::AlreadyActive(to)));
        }

        let from = registry
            .active_account_id
            .and_then(|id| AccountRef::of(registry, id));
        validate_email(&to.email)?;
        if let Some(current) = &from {
            validate_email(&current.email)?;
        }

        if let Some(current) = &from {
            self.backup_current(current).await?;
        }

        let (secret, identity) = self.load_target(&to)?;

        self.credentials.set_active(&secret)?;
        crate::log_debug!(self.logger, "applied credentials of {}", to.label);

        let live = self.host.read_current().await?;
        let merged = merge_identity(live, self.identity_field, &identity);
        self.host.write_current(&merged).await?;
        crate::log_debug!(self.logger, "updated identity in {}", self.host.location());

        let committed = registry.activate(target, Utc::now())?;
        write_atomic(self.registry_path, &committed)?;
        crate::log_info!(self.logger, "switched to {}", to);

        Ok((committed, SwitchOutcome::Switched { from, to }))
    }

    /// Snapshot the live secret and configuration into `current`'s backup slot.
    ///
    /// Skipped when the host has no identity recorded, or when the host is
    /// logged into a different account than the registry believes, since
    /// saving it under `current` would overwrite that account's backup with
    /// someone else's credentials.
    async fn backup_current(&self, current: &AccountRef) -> Result<()> {
        let Some(live) = self.host.read_current().await? else {
            crate::log_debug!(
                self.logger,
                "no live configuration, skipping backup of {}",
                current.label
            );
            return Ok(());
        };
        let Some(identity) = Identity::from_config(&live, self.identity_field) else {
            crate::log_debug!(
                self.logger,
                "no live identity, skipping backup of {}",
                current.label
            );
            return Ok(());
        };
        if identity.email != current.email {
            crate::log_warn!(
                self.logger,
                "host is logged in as {}, not {}; leaving {}'s backup untouched",
                identity.email,
                current.email,
                current.label
            );
            return Ok(());
        }

        match self.credentials.get_active()? {
            Some(secret) => self
                .credentials
                .set_backup(current.id, &current.email, &secret)?,
            None => crate::log_warn!(
                self.logger,
                "no live credentials to back up for {}",
                current.label
            ),
        }
        self.config_backups
            .save(current.id, &current.email, &live)?;
        crate::log_debug!(self.logger, "backed up {}", current.label);
        Ok(())
    }

    /// The target's saved secret and identity section, or `MissingBackup`
    fn load_target(&self, to: &AccountRef) -> Result<(String, Value)> {
        let missing = || Error::MissingBackup {
            label: to.label.clone(),
        };
        let secret = self
            .credentials
            .get_backup(to.id, &to.email)?
            .ok_or_else(missing)?;
        let config = self
            .config_backups
            .load(to.id, &to.email)?
            .ok_or_else(missing)?;
        let identity = identity_section(&config, self.identity_field)
            .cloned()
            .ok_or_else(missing)?;
        Ok((secret, identity))
    }
}
