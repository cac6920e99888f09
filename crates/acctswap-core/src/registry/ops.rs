//! Operations over a `Registry` value

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use super::error::{RegistryError, RegistryResult};
use super::types::{Account, AccountId, NewAccount, Registry};

/// Value `resolve_alias_target` treats as "nobody is logged in"
const NO_CURRENT_ACCOUNT: &str = "none";

impl Registry {
    /// A registry with no accounts
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            active_account_id: None,
            last_updated: now,
            order: Vec::new(),
            accounts: Default::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn account(&self, id: AccountId) -> Option<&Account> {
        self.accounts.get(&id)
    }

    /// The active account, if any
    pub fn active(&self) -> Option<(AccountId, &Account)> {
        let id = self.active_account_id?;
        self.accounts.get(&id).map(|account| (id, account))
    }

    /// Accounts in display order
    pub fn iter_ordered(&self) -> impl Iterator<Item = (AccountId, &Account)> + '_ {
        self.order
            .iter()
            .filter_map(|id| self.accounts.get(id).map(|account| (*id, account)))
    }

    /// 1 for an empty registry, otherwise one past the highest id
    pub fn next_id(&self) -> RegistryResult<AccountId> {
        match self.accounts.keys().max() {
            None => Ok(1),
            Some(max) => max.checked_add(1).ok_or(RegistryError::IdsExhausted),
        }
    }

    pub fn exists(&self, email: &str) -> bool {
        self.id_by_email(email).is_some()
    }

    pub fn id_by_email(&self, email: &str) -> Option<AccountId> {
        self.accounts
            .iter()
            .find(|(_, account)| account.email == email)
            .map(|(id, _)| *id)
    }

    /// Append a new account under `next_id()` and make it active.
    ///
    /// Email and alias must already have been validated by the caller; an
    /// empty alias is treated as no alias.
    pub fn add(&self, new: NewAccount, now: DateTime<Utc>) -> RegistryResult<Registry> {
        let id = self.next_id()?;
        let alias = new.alias.filter(|a| !a.trim().is_empty());

        let mut next = self.clone();
        next.accounts.insert(
            id,
            Account {
                email: new.email,
                external_id: new.external_id,
                added_at: now,
                alias,
            },
        );
        next.order.push(id);
        next.active_account_id = Some(id);
        next.last_updated = now;
        Ok(next)
    }

    /// Drop an account.
    ///
    /// Removing the active account hands "active" to the first remaining
    /// entry in `order`, or clears it when nothing is left.
    pub fn remove(&self, id: AccountId, now: DateTime<Utc>) -> RegistryResult<Registry> {
        if !self.accounts.contains_key(&id) {
            return Err(RegistryError::AccountNotFound(id));
        }

        let mut next = self.clone();
        next.accounts.remove(&id);
        next.order.retain(|other| *other != id);
        if next.active_account_id == Some(id) {
            next.active_account_id = next.order.first().copied();
        }
        next.last_updated = now;
        Ok(next)
    }

    /// The id after the active one in `order`, wrapping around
    pub fn rotate_next(&self) -> RegistryResult<AccountId> {
        if self.order.len() < 2 {
            return Err(RegistryError::TooFewAccounts);
        }
        let active = self
            .active_account_id
            .ok_or(RegistryError::NoActiveAccount)?;
        let index = self
            .order
            .iter()
            .position(|id| *id == active)
            .ok_or_else(|| {
                RegistryError::Inconsistent(format!("active account {active} is not in order"))
            })?;
        Ok(self.order[(index + 1) % self.order.len()])
    }

    /// Resolve a user-supplied token to an internal id.
    ///
    /// A positive integer is tried as a literal internal id first and only
    /// then as a 1-based display position. Anything else is matched against
    /// account emails.
    pub fn resolve_identifier(&self, token: &str) -> Option<AccountId> {
        let token = token.trim();
        if let Some(number) = parse_positive(token) {
            if self.accounts.contains_key(&number) {
                return Some(number);
            }
            return self.order.get(number as usize - 1).copied();
        }
        self.id_by_email(token)
    }

    /// 1-based position of `id` in `order`
    pub fn display_position(&self, id: AccountId) -> Option<usize> {
        self.order.iter().position(|other| *other == id).map(|i| i + 1)
    }

    /// "Account-<position>", or the raw id when `id` is not in `order`
    pub fn display_label(&self, id: AccountId) -> String {
        match self.display_position(id) {
            Some(position) => format!("Account-{position}"),
            None => format!("Account-{id}"),
        }
    }

    /// Attach `alias` to an account.
    ///
    /// Re-applying an account's own alias succeeds; taking another account's
    /// alias fails naming that account.
    pub fn set_alias(
        &self,
        id: AccountId,
        alias: &str,
        now: DateTime<Utc>,
    ) -> RegistryResult<Registry> {
        if !self.accounts.contains_key(&id) {
            return Err(RegistryError::AccountNotFound(id));
        }
        if let Some(owner) = self.find_by_alias(alias) {
            if owner != id {
                return Err(RegistryError::AliasInUse {
                    alias: alias.to_string(),
                    label: self.display_label(owner),
                });
            }
        }

        let mut next = self.clone();
        if let Some(account) = next.accounts.get_mut(&id) {
            account.alias = Some(alias.to_string());
        }
        next.last_updated = now;
        Ok(next)
    }

    pub fn find_by_alias(&self, alias: &str) -> Option<AccountId> {
        self.accounts
            .iter()
            .find(|(_, account)| account.alias.as_deref() == Some(alias))
            .map(|(id, _)| *id)
    }

    /// Pick the account an alias should be attached to.
    ///
    /// An explicit token must be an email; numeric tokens are rejected so an
    /// alias never lands on the wrong account through id/position ambiguity.
    /// Without a token the currently logged-in email is used.
    pub fn resolve_alias_target(
        &self,
        explicit: Option<&str>,
        current_email: Option<&str>,
    ) -> Option<AccountId> {
        if let Some(token) = explicit {
            let token = token.trim();
            if !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            return self.id_by_email(token);
        }
        match current_email {
            None => None,
            Some(email) if email.is_empty() || email == NO_CURRENT_ACCOUNT => None,
            Some(email) => self.id_by_email(email),
        }
    }

    /// Make `id` the active account
    pub fn activate(&self, id: AccountId, now: DateTime<Utc>) -> RegistryResult<Registry> {
        if !self.accounts.contains_key(&id) {
            return Err(RegistryError::AccountNotFound(id));
        }
        let mut next = self.clone();
        next.active_account_id = Some(id);
        next.last_updated = now;
        Ok(next)
    }

    /// Check the structural invariants of a loaded document
    pub fn validate(&self) -> RegistryResult<()> {
        let inconsistent = |msg: String| Err(RegistryError::Inconsistent(msg));

        let mut seen = HashSet::new();
        for id in &self.order {
            if !seen.insert(*id) {
                return inconsistent(format!("id {id} appears twice in order"));
            }
            if !self.accounts.contains_key(id) {
                return inconsistent(format!("id {id} in order has no account"));
            }
        }
        if let Some(id) = self.accounts.keys().find(|id| !seen.contains(*id)) {
            return inconsistent(format!("account {id} is missing from order"));
        }
        if self.accounts.contains_key(&0) {
            return inconsistent("account id 0 is not allowed".to_string());
        }

        let mut emails = HashSet::new();
        let mut aliases = HashSet::new();
        for account in self.accounts.values() {
            if !emails.insert(account.email.as_str()) {
                return inconsistent(format!("email {} appears twice", account.email));
            }
            if let Some(alias) = account.alias.as_deref() {
                if !aliases.insert(alias) {
                    return inconsistent(format!("alias '{alias}' appears twice"));
                }
            }
        }

        if let Some(active) = self.active_account_id {
            if !self.accounts.contains_key(&active) {
                return inconsistent(format!("active account {active} does not exist"));
            }
        }
        Ok(())
    }
}

fn parse_positive(token: &str) -> Option<AccountId> {
    if token.is_empty() || !token.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    token.parse::<AccountId>().ok().filter(|n| *n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    fn two_accounts() -> Registry {
        Registry::empty(now())
            .add(NewAccount::new("a@b.com", "x"), now())
            .unwrap()
            .add(NewAccount::new("c@d.com", "y"), now())
            .unwrap()
    }

    #[test]
    fn test_next_id() {
        let empty = Registry::empty(now());
        assert_eq!(empty.next_id(), Ok(1));

        let registry = two_accounts();
        assert_eq!(registry.next_id(), Ok(3));

        let gap = registry.remove(1, now()).unwrap();
        assert_eq!(gap.next_id(), Ok(3));
    }

    #[test]
    fn test_add_fails_once_ids_run_out() {
        let registry: Registry = serde_json::from_value(serde_json::json!({
            "activeAccountId": 4294967295u32,
            "lastUpdated": "2024-01-01T00:00:00Z",
            "order": [4294967295u32],
            "accounts": {
                "4294967295": {
                    "email": "a@b.com",
                    "externalId": "x",
                    "addedAt": "2024-01-01T00:00:00Z"
                }
            }
        }))
        .unwrap();
        assert!(registry.validate().is_ok());

        assert_eq!(registry.next_id(), Err(RegistryError::IdsExhausted));
        assert_eq!(
            registry.add(NewAccount::new("c@d.com", "y"), now()),
            Err(RegistryError::IdsExhausted)
        );
    }

    #[test]
    fn test_add_then_resolve_by_email() {
        let registry = two_accounts();
        let id = registry.next_id().unwrap();
        let registry = registry.add(NewAccount::new("e@f.org", "z"), now()).unwrap();

        assert_eq!(registry.resolve_identifier("e@f.org"), Some(id));
        assert!(registry.exists("e@f.org"));
        assert!(registry.validate().is_ok());
    }

    #[test]
    fn test_add_is_a_value_transformation() {
        let before = Registry::empty(now());
        let after = before.add(NewAccount::new("a@b.com", "x"), now()).unwrap();

        assert!(before.is_empty());
        assert_eq!(after.len(), 1);
    }

    #[test]
    fn test_add_ignores_empty_alias() {
        let registry = Registry::empty(now())
            .add(NewAccount::new("a@b.com", "x").with_alias("  "), now())
            .unwrap();
        assert_eq!(registry.account(1).unwrap().alias, None);

        let registry = registry
            .add(NewAccount::new("c@d.com", "y").with_alias("work"), now())
            .unwrap();
        assert_eq!(registry.account(2).unwrap().alias.as_deref(), Some("work"));
    }

    #[test]
    fn test_end_to_end_add_and_rotate() {
        let registry = Registry::empty(now()).add(NewAccount::new("a@b.com", "x"), now()).unwrap();
        assert_eq!(registry.order, vec![1]);
        assert_eq!(registry.active_account_id, Some(1));

        let registry = registry.add(NewAccount::new("c@d.com", "y"), now()).unwrap();
        assert_eq!(registry.order, vec![1, 2]);
        assert_eq!(registry.active_account_id, Some(2));

        assert_eq!(registry.rotate_next().unwrap(), 1);
    }

    #[test]
    fn test_remove_sole_account_clears_active() {
        let registry = Registry::empty(now()).add(NewAccount::new("a@b.com", "x"), now()).unwrap();
        let registry = registry.remove(1, now()).unwrap();

        assert!(registry.is_empty());
        assert_eq!(registry.active_account_id, None);
        assert!(registry.validate().is_ok());
    }

    #[test]
    fn test_remove_active_repoints_to_first() {
        let registry = two_accounts()
            .add(NewAccount::new("e@f.org", "z"), now()).unwrap()
            .activate(2, now())
            .unwrap();

        let registry = registry.remove(2, now()).unwrap();
        assert_eq!(registry.order, vec![1, 3]);
        assert_eq!(registry.active_account_id, Some(1));
    }

    #[test]
    fn test_remove_inactive_keeps_active() {
        let registry = two_accounts().remove(1, now()).unwrap();
        assert_eq!(registry.active_account_id, Some(2));
    }

    #[test]
    fn test_remove_unknown_id() {
        assert_eq!(
            two_accounts().remove(9, now()).unwrap_err(),
            RegistryError::AccountNotFound(9)
        );
    }

    #[test]
    fn test_rotate_twice_returns_to_start() {
        let registry = two_accounts();
        let start = registry.active_account_id.unwrap();

        let first = registry.rotate_next().unwrap();
        let registry = registry.activate(first, now()).unwrap();
        let second = registry.rotate_next().unwrap();

        assert_ne!(first, start);
        assert_eq!(second, start);
    }

    #[test]
    fn test_rotate_wraps_around() {
        let registry = two_accounts().add(NewAccount::new("e@f.org", "z"), now()).unwrap();
        assert_eq!(registry.active_account_id, Some(3));
        assert_eq!(registry.rotate_next().unwrap(), 1);
    }

    #[test]
    fn test_rotate_requires_two_accounts_and_active() {
        let single = Registry::empty(now()).add(NewAccount::new("a@b.com", "x"), now()).unwrap();
        assert_eq!(single.rotate_next(), Err(RegistryError::TooFewAccounts));

        let mut no_active = two_accounts();
        no_active.active_account_id = None;
        assert_eq!(no_active.rotate_next(), Err(RegistryError::NoActiveAccount));
    }

    #[test]
    fn test_resolve_by_position() {
        let registry = two_accounts().remove(1, now()).unwrap();
        let registry = registry.add(NewAccount::new("e@f.org", "z"), now()).unwrap();
        // order = [2, 3]; "1" is not an id, so it is position 1
        assert_eq!(registry.resolve_identifier("1"), Some(2));
        assert_eq!(registry.resolve_identifier("4"), None);
    }

    #[test]
    fn test_resolve_prefers_literal_id_over_position() {
        let registry = two_accounts()
            .add(NewAccount::new("e@f.org", "z"), now()).unwrap()
            .remove(1, now())
            .unwrap();
        // order = [2, 3]: position 2 is id 3, but id 2 exists and wins
        assert_eq!(registry.order, vec![2, 3]);
        assert_eq!(registry.resolve_identifier("2"), Some(2));
        assert_eq!(registry.resolve_identifier("3"), Some(3));
    }

    #[test]
    fn test_resolve_rejects_zero_and_unknown() {
        let registry = two_accounts();
        assert_eq!(registry.resolve_identifier("0"), None);
        assert_eq!(registry.resolve_identifier("-1"), None);
        assert_eq!(registry.resolve_identifier("nobody@x.com"), None);
        assert_eq!(registry.resolve_identifier(" c@d.com "), Some(2));
    }

    #[test]
    fn test_display_labels_follow_order() {
        let registry = two_accounts().remove(1, now()).unwrap();
        assert_eq!(registry.display_position(2), Some(1));
        assert_eq!(registry.display_label(2), "Account-1");
        assert_eq!(registry.display_label(7), "Account-7");
    }

    #[test]
    fn test_set_alias_same_account_twice() {
        let registry = two_accounts();
        let registry = registry.set_alias(1, "work", now()).unwrap();
        let registry = registry.set_alias(1, "work", now()).unwrap();

        assert_eq!(registry.find_by_alias("work"), Some(1));
    }

    #[test]
    fn test_set_alias_taken_by_other_account() {
        let registry = two_accounts().set_alias(1, "work", now()).unwrap();

        let err = registry.set_alias(2, "work", now()).unwrap_err();
        assert_eq!(
            err,
            RegistryError::AliasInUse {
                alias: "work".to_string(),
                label: "Account-1".to_string()
            }
        );
        assert!(err.to_string().contains("already in use by Account-1"));
    }

    #[test]
    fn test_set_alias_replaces_previous_alias() {
        let registry = two_accounts()
            .set_alias(1, "work", now())
            .unwrap()
            .set_alias(1, "home", now())
            .unwrap();

        assert_eq!(registry.find_by_alias("work"), None);
        assert_eq!(registry.find_by_alias("home"), Some(1));
    }

    #[test]
    fn test_set_alias_unknown_account() {
        assert_eq!(
            two_accounts().set_alias(5, "x", now()).unwrap_err(),
            RegistryError::AccountNotFound(5)
        );
    }

    #[test]
    fn test_alias_target_rejects_numeric_tokens() {
        let mut registry = Registry::empty(now());
        for i in 0..42 {
            registry = registry.add(NewAccount::new(format!("u{i}@x.com"), "ext"), now()).unwrap();
        }
        assert!(registry.account(42).is_some());

        assert_eq!(registry.resolve_alias_target(Some("42"), None), None);
        assert_eq!(registry.resolve_alias_target(Some("1"), Some("u0@x.com")), None);
    }

    #[test]
    fn test_alias_target_by_email_and_current() {
        let registry = two_accounts();

        assert_eq!(registry.resolve_alias_target(Some("a@b.com"), None), Some(1));
        assert_eq!(registry.resolve_alias_target(None, Some("c@d.com")), Some(2));
        assert_eq!(registry.resolve_alias_target(None, Some("none")), None);
        assert_eq!(registry.resolve_alias_target(None, Some("stranger@x.com")), None);
        assert_eq!(registry.resolve_alias_target(None, None), None);
    }

    #[test]
    fn test_validate_detects_orphans_and_duplicates() {
        let mut registry = two_accounts();
        registry.order.push(1);
        assert!(registry.validate().is_err());

        let mut registry = two_accounts();
        registry.order.retain(|id| *id != 2);
        assert!(registry.validate().is_err());

        let mut registry = two_accounts();
        registry.active_account_id = Some(99);
        assert!(registry.validate().is_err());

        let mut registry = two_accounts();
        registry.accounts.get_mut(&2).unwrap().email = "a@b.com".to_string();
        assert!(registry.validate().is_err());
    }

    #[test]
    fn test_json_shape() {
        let registry = two_accounts().set_alias(2, "work", now()).unwrap();
        let value = serde_json::to_value(&registry).unwrap();

        assert_eq!(value["activeAccountId"], 2);
        assert_eq!(value["order"], serde_json::json!([1, 2]));
        assert_eq!(value["accounts"]["2"]["email"], "c@d.com");
        assert_eq!(value["accounts"]["2"]["externalId"], "y");
        assert_eq!(value["accounts"]["2"]["alias"], "work");
        assert!(value["accounts"]["1"].get("alias").is_none());

        let back: Registry = serde_json::from_value(value).unwrap();
        assert_eq!(back, registry);
    }
}
