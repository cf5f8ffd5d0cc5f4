use crate::error::StoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Loads a JSON document. An absent file is `Ok(None)`; a file that exists but cannot be
/// read or parsed is an error, so writers never replace a document they did not understand.
pub(crate) fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::io(path, e)),
    };
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|source| StoreError::Unparsable {
            path: path.to_path_buf(),
            source,
        })
}

/// Reads a JSON document, degrading to `T::default()` when the file is absent or unreadable.
pub(crate) fn read_json_or_default<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    load_json(path).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Unusable document, treating as empty.");
        None
    })
    .unwrap_or_default()
}

/// Writes a JSON document by replacing the file in one rename, so readers never observe
/// a half-written document.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }

    let body = serde_json::to_vec_pretty(value)?;
    let staging = staging_path(path);
    fs::write(&staging, body).map_err(|e| StoreError::io(&staging, e))?;
    fs::rename(&staging, path).map_err(|e| {
        let _ = fs::remove_file(&staging);
        StoreError::io(path, e)
    })
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
