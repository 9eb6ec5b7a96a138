use crate::error::{Error, Result};
use log::{debug, info};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Returns the sibling backup path for a file: `pyproject.toml` -> `pyproject.toml.backup`
pub fn backup_path(path: &Path) -> PathBuf {
    let mut file_name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| "pyproject.toml".into());
    file_name.push(".backup");
    path.with_file_name(file_name)
}

/// Copies `path` to its backup location when it exists.
///
/// An older backup is overwritten. Returns the backup path if one was written.
pub fn create_backup(path: &Path) -> Result<Option<PathBuf>> {
    if !path.exists() {
        debug!("No existing file at {}, skipping backup", path.display());
        return Ok(None);
    }

    let backup = backup_path(path);
    fs::copy(path, &backup).map_err(|e| Error::FileOperation {
        path: backup.clone(),
        message: format!("Failed to create backup of {}: {}", path.display(), e),
    })?;

    info!("Backup created: {}", backup.display());
    Ok(Some(backup))
}

/// Writes `content` to `path` through a temporary file in the same directory that is
/// renamed over the destination, so a failed write never leaves a partial file behind.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut temp = NamedTempFile::new_in(&parent).map_err(|e| Error::FileOperation {
        path: path.to_path_buf(),
        message: format!(
            "Failed to create temporary file in {}: {}",
            parent.display(),
            e
        ),
    })?;

    temp.write_all(content.as_bytes())
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|e| Error::FileOperation {
            path: path.to_path_buf(),
            message: format!("Failed to write temporary file: {}", e),
        })?;

    // Temporary files are created owner-only; keep the replaced file's mode instead
    if let Ok(metadata) = fs::metadata(path) {
        if let Err(e) = fs::set_permissions(temp.path(), metadata.permissions()) {
            debug!("Could not copy permissions of {}: {}", path.display(), e);
        }
    } else {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Err(e) = fs::set_permissions(temp.path(), fs::Permissions::from_mode(0o644)) {
                debug!("Could not set permissions for {}: {}", path.display(), e);
            }
        }
    }

    temp.persist(path).map_err(|e| Error::FileOperation {
        path: path.to_path_buf(),
        message: format!("Failed to replace file: {}", e.error),
    })?;

    debug!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}
