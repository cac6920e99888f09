//! Configuration
//!
//! - `Settings`: this tool's own YAML settings (where backups live, which
//!   credential backend to use)
//! - `HostConfig`: the host application's live configuration document, whose
//!   identity section is swapped on every switch

mod error;
mod settings;
mod host;

pub use error::{ConfigError, ConfigResult};
pub use settings::{BackendKind, ResolvedBackend, Settings};
pub use host::{
    identity_section, merge_identity, FileHostConfig, HostConfig, Identity, MemoryHostConfig,
};
