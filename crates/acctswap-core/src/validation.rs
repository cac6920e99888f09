//! Input validation shared by every entry point
//!
//! Emails and ids end up inside keychain entry names and file names, so they
//! are checked here before any backend or path is built from them. Alias
//! rules live here too so that `add --alias` and `alias` cannot drift apart.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::registry::AccountId;

/// Command names that can never be used as an alias
pub const RESERVED_NAMES: &[&str] = &[
    "list", "add", "remove", "next", "status", "alias", "help", "switch",
];

const MAX_EMAIL_LEN: usize = 254;
const MAX_ALIAS_LEN: usize = 32;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$")
        .expect("email pattern is a valid regex")
});

static ALIAS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_\-]*$").expect("alias pattern is a valid regex")
});

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid email address: {0:?}")]
    InvalidEmail(String),

    #[error("Invalid alias '{alias}': {reason}")]
    InvalidAlias { alias: String, reason: &'static str },

    #[error("Alias '{0}' is reserved for a command name")]
    ReservedAlias(String),

    #[error("Invalid account id: {0}")]
    InvalidAccountId(AccountId),
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Check that an email is well formed and safe to embed in a key or file name
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let invalid = || ValidationError::InvalidEmail(email.to_string());

    if email.is_empty() || email.len() > MAX_EMAIL_LEN {
        return Err(invalid());
    }
    if email.starts_with('-') || email.starts_with('.') || email.contains("..") {
        return Err(invalid());
    }
    if email
        .chars()
        .any(|c| c == '/' || c == '\\' || c.is_whitespace() || c.is_control())
    {
        return Err(invalid());
    }
    if !EMAIL_PATTERN.is_match(email) {
        return Err(invalid());
    }
    Ok(())
}

/// Check alias format and reserved names. Uniqueness is the registry's job.
pub fn validate_alias(alias: &str) -> ValidationResult<()> {
    let invalid = |reason| ValidationError::InvalidAlias {
        alias: alias.to_string(),
        reason,
    };

    if alias.is_empty() {
        return Err(invalid("alias cannot be empty"));
    }
    if alias.len() > MAX_ALIAS_LEN {
        return Err(invalid("alias is longer than 32 characters"));
    }
    if alias.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("alias cannot be a number"));
    }
    if !ALIAS_PATTERN.is_match(alias) {
        return Err(invalid(
            "use letters, digits, '-' and '_', starting with a letter or digit",
        ));
    }
    if is_reserved(alias) {
        return Err(ValidationError::ReservedAlias(alias.to_string()));
    }
    Ok(())
}

pub fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(name))
}

pub fn validate_account_id(id: AccountId) -> ValidationResult<()> {
    if id == 0 {
        return Err(ValidationError::InvalidAccountId(id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        for email in ["a@b.com", "first.last+tag@example.co.uk", "x_y%z@sub-domain.io"] {
            assert!(validate_email(email).is_ok(), "{email}");
        }
    }

    #[test]
    fn test_unsafe_emails_rejected() {
        for email in [
            "",
            "no-at-sign",
            "a@b",
            "../../etc/passwd@x.com",
            "a/b@c.com",
            "a\\b@c.com",
            "a b@c.com",
            "a@b..com",
            "-rf@c.com",
            ".hidden@c.com",
            "a@b.com\n",
        ] {
            assert!(validate_email(email).is_err(), "{email:?}");
        }
        let long = format!("{}@example.com", "a".repeat(250));
        assert!(validate_email(&long).is_err());
    }

    #[test]
    fn test_alias_rules() {
        assert!(validate_alias("work").is_ok());
        assert!(validate_alias("work-2_b").is_ok());
        assert!(validate_alias("2fa").is_ok());

        assert!(matches!(validate_alias(""), Err(ValidationError::InvalidAlias { .. })));
        assert!(matches!(validate_alias("42"), Err(ValidationError::InvalidAlias { .. })));
        assert!(matches!(validate_alias("-x"), Err(ValidationError::InvalidAlias { .. })));
        assert!(matches!(validate_alias("a b"), Err(ValidationError::InvalidAlias { .. })));
        assert!(matches!(
            validate_alias(&"a".repeat(33)),
            Err(ValidationError::InvalidAlias { .. })
        ));
    }

    #[test]
    fn test_reserved_names_case_insensitive() {
        assert_eq!(
            validate_alias("List"),
            Err(ValidationError::ReservedAlias("List".to_string()))
        );
        for name in RESERVED_NAMES {
            assert!(validate_alias(name).is_err());
        }
    }

    #[test]
    fn test_account_id() {
        assert!(validate_account_id(0).is_err());
        assert!(validate_account_id(1).is_ok());
    }
}
