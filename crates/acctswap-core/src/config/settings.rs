//! Tool settings (YAML)
//!
//! Read from `<config dir>/acctswap/config.yaml` (or `$ACCTSWAP_CONFIG`).
//! A missing file means defaults; `$ACCTSWAP_HOME` overrides the backup root.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::{ConfigError, ConfigResult};
use crate::store::BackupLayout;

const DEFAULT_BACKUP_DIR: &str = ".claude-swap-backup";
const DEFAULT_IDENTITY_FIELD: &str = "oauthAccount";
const DEFAULT_KEYCHAIN_SERVICE: &str = "Claude Code-credentials";
const DEFAULT_BACKUP_SERVICE: &str = "acctswap";

/// Where credentials are kept, as written in the settings file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Keychain on macOS, files everywhere else
    #[default]
    Auto,
    Keychain,
    File,
}

/// Backend actually used once `Auto` is settled for this platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedBackend {
    Keychain,
    File,
}

impl BackendKind {
    pub fn resolve(self) -> ResolvedBackend {
        match self {
            BackendKind::Keychain => ResolvedBackend::Keychain,
            BackendKind::File => ResolvedBackend::File,
            BackendKind::Auto if cfg!(target_os = "macos") => ResolvedBackend::Keychain,
            BackendKind::Auto => ResolvedBackend::File,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Auto => "auto",
            BackendKind::Keychain => "keychain",
            BackendKind::File => "file",
        }
    }
}

/// Settings file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root of registry, lock and backups
    pub backup_root: Option<PathBuf>,
    /// Host application's live configuration document
    pub host_config: Option<PathBuf>,
    /// Key of the identity object inside the host configuration
    pub identity_field: String,
    pub credential_backend: BackendKind,
    /// Host credentials file (file backend)
    pub active_credentials_file: Option<PathBuf>,
    /// Keychain service holding the host's live credentials (keychain backend)
    pub keychain_service: String,
    /// Keychain account of the live entry; defaults to the login name
    pub keychain_account: Option<String>,
    /// Keychain service for per-account backups
    pub backup_service: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backup_root: None,
            host_config: None,
            identity_field: DEFAULT_IDENTITY_FIELD.to_string(),
            credential_backend: BackendKind::Auto,
            active_credentials_file: None,
            keychain_service: DEFAULT_KEYCHAIN_SERVICE.to_string(),
            keychain_account: None,
            backup_service: DEFAULT_BACKUP_SERVICE.to_string(),
        }
    }
}

impl Settings {
    /// `$ACCTSWAP_CONFIG`, else `<config dir>/acctswap/config.yaml`
    pub fn default_path() -> PathBuf {
        if let Some(path) = std::env::var_os("ACCTSWAP_CONFIG") {
            return PathBuf::from(path);
        }
        let config_dir = dirs::config_dir().unwrap_or_else(|| home_dir().join(".config"));
        config_dir.join("acctswap").join("config.yaml")
    }

    /// Load from the default location and apply environment overrides
    pub fn load() -> ConfigResult<Self> {
        Ok(Self::load_from(&Self::default_path())?.with_env_overrides())
    }

    /// Load from `path`; a missing file yields defaults
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Some(root) = std::env::var_os("ACCTSWAP_HOME") {
            self.backup_root = Some(PathBuf::from(root));
        }
        self
    }

    pub fn backup_root(&self) -> PathBuf {
        match &self.backup_root {
            Some(root) => expand_home(root),
            None => home_dir().join(DEFAULT_BACKUP_DIR),
        }
    }

    pub fn layout(&self) -> BackupLayout {
        BackupLayout::new(self.backup_root())
    }

    /// Configured path, else the first existing of `~/.claude/.claude.json`
    /// and `~/.claude.json` (the latter when neither exists)
    pub fn host_config_path(&self) -> PathBuf {
        if let Some(path) = &self.host_config {
            return expand_home(path);
        }
        let home = home_dir();
        let nested = home.join(".claude").join(".claude.json");
        if nested.is_file() {
            nested
        } else {
            home.join(".claude.json")
        }
    }

    pub fn active_credentials_path(&self) -> PathBuf {
        match &self.active_credentials_file {
            Some(path) => expand_home(path),
            None => home_dir().join(".claude").join(".credentials.json"),
        }
    }

    pub fn keychain_account(&self) -> String {
        self.keychain_account
            .clone()
            .or_else(|| std::env::var("USER").ok())
            .or_else(|| std::env::var("USERNAME").ok())
            .unwrap_or_else(|| "default".to_string())
    }
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Expand a leading `~` to the home directory
fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => home_dir().join(rest),
        Err(_) => path.to_path_buf(),
    }
}
