//! The host application's live configuration
//!
//! The host keeps one JSON document with many settings; only its identity
//! section (`oauthAccount` by default) belongs to an account. Switching
//! replaces that section and leaves everything else alone.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};

use super::error::ConfigResult;
use crate::store::{read_optional, write_atomic};

/// Access to the host's "current configuration" document
///
/// Implementations:
/// - `FileHostConfig`: the JSON file the host application reads
/// - `MemoryHostConfig`: In-memory for testing
#[async_trait]
pub trait HostConfig: Send + Sync {
    /// Where the document lives, for messages
    fn location(&self) -> String;

    /// The live document, or `None` if the host has not written one yet
    async fn read_current(&self) -> ConfigResult<Option<Value>>;

    /// Replace the live document
    async fn write_current(&self, config: &Value) -> ConfigResult<()>;
}

/// Host configuration stored in a JSON file, written atomically
#[derive(Debug, Clone)]
pub struct FileHostConfig {
    path: PathBuf,
}

impl FileHostConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl HostConfig for FileHostConfig {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    async fn read_current(&self) -> ConfigResult<Option<Value>> {
        Ok(read_optional(&self.path)?)
    }

    async fn write_current(&self, config: &Value) -> ConfigResult<()> {
        write_atomic(&self.path, config)?;
        Ok(())
    }
}

/// In-memory host configuration for testing
#[derive(Debug, Default)]
pub struct MemoryHostConfig {
    document: RwLock<Option<Value>>,
}

impl MemoryHostConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: Value) -> Self {
        Self {
            document: RwLock::new(Some(document)),
        }
    }

    /// Snapshot of the current document
    pub fn document(&self) -> Option<Value> {
        self.document.read().clone()
    }

    pub fn set_document(&self, document: Option<Value>) {
        *self.document.write() = document;
    }
}

#[async_trait]
impl HostConfig for MemoryHostConfig {
    fn location(&self) -> String {
        "memory".to_string()
    }

    async fn read_current(&self) -> ConfigResult<Option<Value>> {
        Ok(self.document())
    }

    async fn write_current(&self, config: &Value) -> ConfigResult<()> {
        self.set_document(Some(config.clone()));
        Ok(())
    }
}

/// Who is logged in, as recorded in a configuration document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
    pub external_id: String,
}

impl Identity {
    /// Read `emailAddress` / `accountUuid` from the identity section
    pub fn from_config(config: &Value, field: &str) -> Option<Self> {
        let section = identity_section(config, field)?;
        let email = section.get("emailAddress")?.as_str()?.trim();
        if email.is_empty() {
            return None;
        }
        let external_id = section
            .get("accountUuid")
            .and_then(Value::as_str)
            .unwrap_or_default();
        Some(Self {
            email: email.to_string(),
            external_id: external_id.to_string(),
        })
    }
}

/// The identity object inside `config`, if present and non-null
pub fn identity_section<'a>(config: &'a Value, field: &str) -> Option<&'a Value> {
    config.get(field).filter(|section| section.is_object())
}

/// `live` with only its identity section replaced by `identity`.
///
/// A missing or non-object live document starts from `{}`.
pub fn merge_identity(live: Option<Value>, field: &str, identity: &Value) -> Value {
    let mut document = match live {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    document.insert(field.to_string(), identity.clone());
    Value::Object(document)
}
