//! Atomic JSON persistence
//!
//! Every write goes to an exclusively created temp file in the destination
//! directory and is renamed over the target, so readers observe either the
//! old document or the new one and never a partial write.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tempfile::NamedTempFile;

use super::error::{StoreError, StoreResult};

#[cfg(unix)]
const PRIVATE_FILE_MODE: u32 = 0o600;
#[cfg(unix)]
const PRIVATE_DIR_MODE: u32 = 0o700;

/// Serialize `document` and atomically replace `path` with it.
///
/// The serialization is parsed back and compared before anything touches the
/// disk. If any step fails the temp file is removed and the previous contents
/// of `path` are left as they were.
pub fn write_atomic<T: Serialize + ?Sized>(path: &Path, document: &T) -> StoreResult<()> {
    let bytes = serialize_checked(path, document)?;
    write_bytes_atomic(path, &bytes)
}

/// Atomically replace `path` with raw bytes (owner-only permissions).
pub fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    let temp = stage(path, bytes)?;
    temp.persist(path)
        .map_err(|e| StoreError::io(path, e.error))?;
    restrict_file(path)
}

/// Create `path` from `document` only if it does not exist yet.
///
/// Returns `Ok(false)` without touching the file when it is already present.
pub fn write_new<T: Serialize + ?Sized>(path: &Path, document: &T) -> StoreResult<bool> {
    if path.exists() {
        return Ok(false);
    }
    let bytes = serialize_checked(path, document)?;
    let temp = stage(path, &bytes)?;
    match temp.persist_noclobber(path) {
        Ok(_) => {}
        Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(StoreError::io(path, e.error)),
    }
    restrict_file(path)?;
    Ok(true)
}

/// Read and parse a JSON document. Schema checks are up to the caller.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> StoreResult<T> {
    let content = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    serde_json::from_str(&content).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Like `read_document`, but a missing file is `Ok(None)`.
pub fn read_optional<T: DeserializeOwned>(path: &Path) -> StoreResult<Option<T>> {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| StoreError::Parse {
                path: path.to_path_buf(),
                source,
            }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::io(path, e)),
    }
}

/// Create `dir` (and missing ancestors) with owner-only permissions.
///
/// Existing directories are left alone.
pub fn ensure_private_dir(dir: &Path) -> StoreResult<()> {
    if dir.is_dir() {
        return Ok(());
    }
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::{DirBuilderExt, PermissionsExt};
        builder.mode(PRIVATE_DIR_MODE);
        builder.create(dir).map_err(|e| StoreError::io(dir, e))?;
        // umask may have widened or narrowed the mode
        fs::set_permissions(dir, fs::Permissions::from_mode(PRIVATE_DIR_MODE))
            .map_err(|e| StoreError::io(dir, e))?;
    }
    #[cfg(not(unix))]
    builder.create(dir).map_err(|e| StoreError::io(dir, e))?;
    Ok(())
}

fn serialize_checked<T: Serialize + ?Sized>(path: &Path, document: &T) -> StoreResult<Vec<u8>> {
    let serialize_err = |source| StoreError::Serialize {
        path: path.to_path_buf(),
        source,
    };
    let value = serde_json::to_value(document).map_err(serialize_err)?;
    let mut text = serde_json::to_string_pretty(&value).map_err(serialize_err)?;
    text.push('\n');

    let reparsed: Value = serde_json::from_str(&text).map_err(|_| StoreError::RoundTrip {
        path: path.to_path_buf(),
    })?;
    if reparsed != value {
        return Err(StoreError::RoundTrip {
            path: path.to_path_buf(),
        });
    }
    Ok(text.into_bytes())
}

/// Write `bytes` to a fresh temp file next to `path` and fsync it.
///
/// The returned handle deletes the temp file when dropped, which covers every
/// early return between here and the rename.
fn stage(path: &Path, bytes: &[u8]) -> StoreResult<NamedTempFile> {
    if path.is_dir() {
        return Err(StoreError::io(
            path,
            io::Error::new(io::ErrorKind::InvalidInput, "target path is a directory"),
        ));
    }
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    ensure_private_dir(parent)?;

    let prefix = format!(
        ".{}.",
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string())
    );
    let mut temp = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(|e| StoreError::io(parent, e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp.as_file()
            .set_permissions(fs::Permissions::from_mode(PRIVATE_FILE_MODE))
            .map_err(|e| StoreError::io(temp.path(), e))?;
    }

    temp.as_file_mut()
        .write_all(bytes)
        .map_err(|e| StoreError::io(path, e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| StoreError::io(path, e))?;
    Ok(temp)
}

fn restrict_file(path: &Path) -> StoreResult<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(PRIVATE_FILE_MODE))
            .map_err(|e| StoreError::io(path, e))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn leftover_temp_files(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.ends_with(".tmp"))
            .collect()
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.json");

        write_atomic(&path, &json!({"a": 1, "b": [true, null]})).unwrap();

        let back: Value = read_document(&path).unwrap();
        assert_eq!(back, json!({"a": 1, "b": [true, null]}));
        assert!(leftover_temp_files(dir.path()).is_empty());
    }

    #[test]
    fn test_unserializable_value_keeps_previous_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.json");
        write_atomic(&path, &json!({"keep": "me"})).unwrap();

        // Tuple keys cannot become JSON object keys.
        let mut bad: HashMap<(u8, u8), u8> = HashMap::new();
        bad.insert((1, 2), 3);
        let err = write_atomic(&path, &bad).unwrap_err();
        assert!(matches!(err, StoreError::Serialize { .. }));

        let back: Value = read_document(&path).unwrap();
        assert_eq!(back, json!({"keep": "me"}));
        assert!(leftover_temp_files(dir.path()).is_empty());
    }

    #[test]
    fn test_write_into_directory_target_fails_cleanly() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("occupied");
        fs::create_dir(&target).unwrap();

        assert!(write_atomic(&target, &json!({})).is_err());
        assert!(target.is_dir());
        assert!(leftover_temp_files(dir.path()).is_empty());
    }

    #[test]
    fn test_creates_missing_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("doc.json");

        write_atomic(&path, &json!([1, 2, 3])).unwrap();
        assert!(path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_permissions_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let parent = dir.path().join("private");
        let path = parent.join("doc.json");
        write_atomic(&path, &json!({})).unwrap();

        let file_mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        let dir_mode = fs::metadata(&parent).unwrap().permissions().mode() & 0o777;
        assert_eq!(file_mode, 0o600);
        assert_eq!(dir_mode, 0o700);
    }

    #[test]
    fn test_write_new_never_overwrites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("registry.json");

        assert!(write_new(&path, &json!({"first": true})).unwrap());
        assert!(!write_new(&path, &json!({"second": true})).unwrap());

        let back: Value = read_document(&path).unwrap();
        assert_eq!(back, json!({"first": true}));
    }

    #[test]
    fn test_read_optional_missing_file() {
        let dir = tempdir().unwrap();
        let missing: Option<Value> = read_optional(&dir.path().join("nope.json")).unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_read_document_reports_parse_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let err = read_document::<Value>(&path).unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));
        assert_eq!(err.path(), path.as_path());
    }
}
