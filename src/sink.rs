use crate::{EventError, Result};
use serde::Serialize;
use std::{
    fs::Permissions,
    io::Write,
    path::Path,
};
use tempfile::NamedTempFile;

/// Writes `value` to `path` as pretty-printed JSON, replacing previous content.
///
/// Missing parent directories are created. Content goes to a temporary file next to `path`
/// which is then renamed over it, so readers see either the previous or the new document.
/// Permissions of the replaced file are kept.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let sink_error = |e: &dyn std::fmt::Display| EventError::SinkWrite(format!("{}: {e}", path.display()));

    let mut content = serde_json::to_string_pretty(value).map_err(|e| sink_error(&e))?;
    content.push('\n');

    let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            std::fs::create_dir_all(parent).map_err(|e| sink_error(&e))?;
            parent
        }
        None => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(parent).map_err(|e| sink_error(&e))?;
    file.write_all(content.as_bytes()).map_err(|e| sink_error(&e))?;

    let permissions = match std::fs::metadata(path) {
        Ok(metadata) => Some(metadata.permissions()),
        Err(_) => new_file_permissions(),
    };
    if let Some(permissions) = permissions {
        file.as_file().set_permissions(permissions).map_err(|e| sink_error(&e))?;
    }

    file.persist(path).map_err(|e| sink_error(&e))?;
    Ok(())
}

/// Same as [`write_json`] but runs on the blocking thread pool.
#[cfg(feature = "async")]
pub async fn write_json_async<T: Serialize + Send + 'static>(path: std::path::PathBuf, value: T) -> Result<()> {
    let display = path.display().to_string();
    tokio::task::spawn_blocking(move || write_json(&path, &value))
        .await
        .map_err(|e| EventError::SinkWrite(format!("{display}: {e}")))?
}

// temporary files are created owner-only
#[cfg(unix)]
fn new_file_permissions() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<Permissions> {
    None
}
