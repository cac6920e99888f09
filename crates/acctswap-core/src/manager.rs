//! Locked command layer
//!
//! Every mutating command follows the same shape: take the lock, load (or
//! lazily create) the registry, validate, act, persist. The lock is a guard
//! held for the whole command, so it is released on success, on error and
//! on cancellation alike. Read-only commands never lock and never create
//! files.

use std::io;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::{FileHostConfig, HostConfig, Identity, Settings};
use crate::error::{Error, Result};
use crate::logging::SharedLogger;
use crate::registry::{AccountId, NewAccount, Registry};
use crate::secrets::{CredentialBackend, SlotCredentials};
use crate::store::{
    acquire_lock, read_optional, write_atomic, write_new, BackupLayout, ConfigBackups, LockGuard,
    StoreError,
};
use crate::switch::{AccountRef, SwitchOutcome, SwitchProtocol};
use crate::validation::{validate_alias, validate_email};

/// One row of `list`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSummary {
    pub id: AccountId,
    pub position: usize,
    pub label: String,
    pub email: String,
    pub alias: Option<String>,
    pub added_at: DateTime<Utc>,
    pub active: bool,
}

impl AccountSummary {
    fn all(registry: &Registry) -> Vec<Self> {
        registry
            .iter_ordered()
            .enumerate()
            .map(|(index, (id, account))| Self {
                id,
                position: index + 1,
                label: registry.display_label(id),
                email: account.email.clone(),
                alias: account.alias.clone(),
                added_at: account.added_at,
                active: registry.active_account_id == Some(id),
            })
            .collect()
    }

    fn of(registry: &Registry, id: AccountId) -> Option<Self> {
        Self::all(registry).into_iter().find(|s| s.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    /// Email the host application is logged in with
    pub live_email: Option<String>,
    /// The managed account matching `live_email`
    pub live_account: Option<AccountSummary>,
    /// The account the registry records as active
    pub registry_active: Option<AccountSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveReport {
    pub removed: AccountRef,
    pub was_active: bool,
    /// Where "active" moved to when the removed account was active
    pub new_active: Option<AccountRef>,
}

/// Result of a command that asks the user to pick an account
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection<T> {
    Done(T),
    Cancelled,
}

/// Interactive account chooser; `Ok(None)` means the user backed out
pub trait Picker {
    fn pick(&self, prompt: &str, accounts: &[AccountSummary]) -> io::Result<Option<AccountId>>;
}

impl<F> Picker for F
where
    F: Fn(&str, &[AccountSummary]) -> io::Result<Option<AccountId>>,
{
    fn pick(&self, prompt: &str, accounts: &[AccountSummary]) -> io::Result<Option<AccountId>> {
        self(prompt, accounts)
    }
}

pub struct AccountManager {
    layout: BackupLayout,
    credentials: Arc<dyn CredentialBackend>,
    host: Arc<dyn HostConfig>,
    config_backups: ConfigBackups,
    identity_field: String,
    logger: SharedLogger,
}

impl AccountManager {
    pub fn new(
        layout: BackupLayout,
        credentials: Arc<dyn CredentialBackend>,
        host: Arc<dyn HostConfig>,
        identity_field: impl Into<String>,
        logger: SharedLogger,
    ) -> Self {
        let config_backups = ConfigBackups::new(layout.configs_dir());
        Self {
            layout,
            credentials,
            host,
            config_backups,
            identity_field: identity_field.into(),
            logger,
        }
    }

    /// Wire up the backends named in `settings`
    pub fn from_settings(settings: &Settings, logger: SharedLogger) -> Result<Self> {
        let layout = settings.layout();
        let credentials = SlotCredentials::from_settings(settings, &layout)?;
        let host = FileHostConfig::new(settings.host_config_path());
        crate::log_debug!(
            logger,
            "backup root {}, host config {}, backend {}",
            layout.root().display(),
            host.location(),
            credentials.name()
        );
        Ok(Self::new(
            layout,
            Arc::new(credentials),
            Arc::new(host),
            settings.identity_field.clone(),
            logger,
        ))
    }

    pub fn layout(&self) -> &BackupLayout {
        &self.layout
    }

    /// Accounts in display order. Does not lock or create anything.
    pub async fn list(&self) -> Result<Vec<AccountSummary>> {
        Ok(self
            .load_registry()?
            .map(|registry| AccountSummary::all(&registry))
            .unwrap_or_default())
    }

    pub async fn status(&self) -> Result<StatusReport> {
        let registry = self.load_registry()?;
        let live_email = self.live_identity().await?.map(|identity| identity.email);

        let (live_account, registry_active) = match &registry {
            Some(registry) => (
                live_email
                    .as_deref()
                    .and_then(|email| registry.id_by_email(email))
                    .and_then(|id| AccountSummary::of(registry, id)),
                registry
                    .active_account_id
                    .and_then(|id| AccountSummary::of(registry, id)),
            ),
            None => (None, None),
        };
        Ok(StatusReport {
            live_email,
            live_account,
            registry_active,
        })
    }

    /// Start managing the account the host application is logged in with.
    ///
    /// Its live secret and configuration become the new account's backup,
    /// and it becomes the active account.
    pub async fn add_current(&self, alias: Option<&str>) -> Result<AccountSummary> {
        let alias = alias.map(str::trim).filter(|a| !a.is_empty());
        if let Some(alias) = alias {
            validate_alias(alias)?;
        }

        let _lock = self.lock()?;
        let registry = self.load_or_init()?;

        let live = self
            .host
            .read_current()
            .await?
            .ok_or_else(|| self.not_logged_in())?;
        let identity =
            Identity::from_config(&live, &self.identity_field).ok_or_else(|| self.not_logged_in())?;
        validate_email(&identity.email)?;

        if let Some(existing) = registry.id_by_email(&identity.email) {
            return Err(Error::AlreadyManaged {
                email: identity.email,
                label: registry.display_label(existing),
            });
        }
        if let Some(alias) = alias {
            if let Some(owner) = registry.find_by_alias(alias) {
                return Err(crate::registry::RegistryError::AliasInUse {
                    alias: alias.to_string(),
                    label: registry.display_label(owner),
                }
                .into());
            }
        }

        let secret = self.credentials.get_active()?.ok_or_else(|| {
            Error::not_found(format!(
                "No live credentials found for {}; log in to the host application first",
                identity.email
            ))
        })?;

        let id = registry.next_id()?;
        self.credentials.set_backup(id, &identity.email, &secret)?;
        let saved = self
            .config_backups
            .save(id, &identity.email, &live)
            .and_then(|()| {
                let mut new = NewAccount::new(identity.email.clone(), identity.external_id.clone());
                new.alias = alias.map(str::to_string);
                let next = registry.add(new, Utc::now())?;
                self.persist(&next)?;
                Ok(next)
            });

        let next = match saved {
            Ok(next) => next,
            Err(e) => {
                let _ = self.credentials.delete_backup(id, &identity.email);
                let _ = self.config_backups.delete(id, &identity.email);
                return Err(e);
            }
        };

        crate::log_info!(self.logger, "added {} as {}", identity.email, next.display_label(id));
        AccountSummary::of(&next, id)
            .ok_or_else(|| Error::not_found(format!("account {id} vanished after add")))
    }

    /// Stop managing an account and delete its backups
    pub async fn remove(&self, token: &str) -> Result<RemoveReport> {
        let _lock = self.lock()?;
        let registry = self.load_or_init()?;
        let id = self.resolve(&registry, token)?;
        self.remove_locked(&registry, id)
    }

    /// `remove` with the account chosen through `picker`
    pub async fn remove_interactive(&self, picker: &dyn Picker) -> Result<Selection<RemoveReport>> {
        let _lock = self.lock()?;
        let registry = self.load_or_init()?;
        match self.pick(&registry, picker, "Remove which account?")? {
            Some(id) => Ok(Selection::Done(self.remove_locked(&registry, id)?)),
            None => Ok(Selection::Cancelled),
        }
    }

    /// Switch to the account named by an id, position, email
    pub async fn switch(&self, token: &str) -> Result<SwitchOutcome> {
        let _lock = self.lock()?;
        let registry = self.load_or_init()?;
        let id = self.resolve(&registry, token)?;
        self.switch_locked(&registry, id).await
    }

    /// Switch to the account with internal id `id`
    pub async fn switch_to(&self, id: AccountId) -> Result<SwitchOutcome> {
        let _lock = self.lock()?;
        let registry = self.load_or_init()?;
        self.switch_locked(&registry, id).await
    }

    /// Switch to the account after the active one
    pub async fn next(&self) -> Result<SwitchOutcome> {
        let _lock = self.lock()?;
        let registry = self.load_or_init()?;
        let id = registry.rotate_next()?;
        self.switch_locked(&registry, id).await
    }

    /// `switch` with the account chosen through `picker`
    pub async fn switch_interactive(
        &self,
        picker: &dyn Picker,
    ) -> Result<Selection<SwitchOutcome>> {
        let _lock = self.lock()?;
        let registry = self.load_or_init()?;
        match self.pick(&registry, picker, "Switch to which account?")? {
            Some(id) => Ok(Selection::Done(self.switch_locked(&registry, id).await?)),
            None => Ok(Selection::Cancelled),
        }
    }

    /// Attach `alias` to the account with `email`, or to the logged-in
    /// account when no email is given
    pub async fn set_alias(&self, alias: &str, email: Option<&str>) -> Result<AccountSummary> {
        let alias = alias.trim();
        validate_alias(alias)?;

        let _lock = self.lock()?;
        let registry = self.load_or_init()?;

        let live_email = match email {
            Some(_) => None,
            None => self.live_identity().await?.map(|identity| identity.email),
        };
        let id = registry
            .resolve_alias_target(email, live_email.as_deref())
            .ok_or_else(|| match email {
                Some(token) if !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()) => {
                    Error::not_found(format!(
                        "Aliases are set by email, not by number: {token}"
                    ))
                }
                Some(token) => Error::not_found(format!("No managed account with email {token}")),
                None => Error::not_found(
                    "The logged-in account is not managed; pass an email or run `add` first",
                ),
            })?;

        let next = registry.set_alias(id, alias, Utc::now())?;
        self.persist(&next)?;
        crate::log_info!(self.logger, "alias '{}' -> {}", alias, next.display_label(id));
        AccountSummary::of(&next, id)
            .ok_or_else(|| Error::not_found(format!("account {id} vanished after alias")))
    }

    /// Switch to the account carrying `alias`
    pub async fn switch_alias(&self, alias: &str) -> Result<SwitchOutcome> {
        let _lock = self.lock()?;
        let registry = self.load_or_init()?;
        let id = registry.find_by_alias(alias.trim()).ok_or_else(|| {
            Error::not_found(format!(
                "Unknown command or alias '{}'; run `acctswap help` for usage",
                alias.trim()
            ))
        })?;
        self.switch_locked(&registry, id).await
    }

    fn lock(&self) -> Result<LockGuard> {
        Ok(acquire_lock(&self.layout.lock_path())?)
    }

    fn load_registry(&self) -> Result<Option<Registry>> {
        let path = self.layout.registry_path();
        let Some(registry) = read_optional::<Registry>(&path)? else {
            return Ok(None);
        };
        registry
            .validate()
            .map_err(|e| StoreError::corrupt(&path, e.to_string()))?;
        Ok(Some(registry))
    }

    /// Load, creating an empty registry on first use. Requires the lock.
    fn load_or_init(&self) -> Result<Registry> {
        if let Some(registry) = self.load_registry()? {
            return Ok(registry);
        }
        let empty = Registry::empty(Utc::now());
        if write_new(&self.layout.registry_path(), &empty)? {
            crate::log_debug!(self.logger, "created {}", self.layout.registry_path().display());
            return Ok(empty);
        }
        // Someone created it between our read and write; use theirs.
        self.load_registry()?
            .ok_or_else(|| Error::not_found("registry disappeared during initialization"))
    }

    fn persist(&self, registry: &Registry) -> Result<()> {
        write_atomic(&self.layout.registry_path(), registry)?;
        Ok(())
    }

    async fn live_identity(&self) -> Result<Option<Identity>> {
        Ok(self
            .host
            .read_current()
            .await?
            .and_then(|live| Identity::from_config(&live, &self.identity_field)))
    }

    fn not_logged_in(&self) -> Error {
        Error::not_found(format!(
            "No account is logged in (no '{}' in {})",
            self.identity_field,
            self.host.location()
        ))
    }

    fn resolve(&self, registry: &Registry, token: &str) -> Result<AccountId> {
        registry
            .resolve_identifier(token)
            .ok_or_else(|| Error::not_found(format!("No account matches '{}'", token.trim())))
    }

    fn pick(
        &self,
        registry: &Registry,
        picker: &dyn Picker,
        prompt: &str,
    ) -> Result<Option<AccountId>> {
        let accounts = AccountSummary::all(registry);
        if accounts.is_empty() {
            return Err(Error::not_found("No accounts are managed yet; run `add` first"));
        }
        let choice = picker.pick(prompt, &accounts)?;
        if let Some(id) = choice {
            if registry.account(id).is_none() {
                return Err(Error::not_found(format!("No account with id {id}")));
            }
        }
        Ok(choice)
    }

    fn remove_locked(&self, registry: &Registry, id: AccountId) -> Result<RemoveReport> {
        let removed = AccountRef::of(registry, id)
            .ok_or(crate::registry::RegistryError::AccountNotFound(id))?;
        validate_email(&removed.email)?;

        // A backup may outlive its account, never the reverse.
        let next = registry.remove(id, Utc::now())?;
        self.persist(&next)?;
        self.credentials.delete_backup(id, &removed.email)?;
        self.config_backups.delete(id, &removed.email)?;

        let was_active = registry.active_account_id == Some(id);
        let new_active = if was_active {
            next.active_account_id.and_then(|id| AccountRef::of(&next, id))
        } else {
            None
        };
        crate::log_info!(self.logger, "removed {}", removed);
        Ok(RemoveReport {
            removed,
            was_active,
            new_active,
        })
    }

    async fn switch_locked(&self, registry: &Registry, id: AccountId) -> Result<SwitchOutcome> {
        let registry_path = self.layout.registry_path();
        let protocol = SwitchProtocol {
            credentials: self.credentials.as_ref(),
            host: self.host.as_ref(),
            config_backups: &self.config_backups,
            registry_path: &registry_path,
            identity_field: &self.identity_field,
            logger: self.logger.as_ref(),
        };
        let (_, outcome) = protocol.run(registry, id).await?;
        Ok(outcome)
    }
}
