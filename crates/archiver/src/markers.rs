use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};

/// Path of the marker which suppresses length verification for a VOD.
pub fn ignore_length_path(store_directory: &Path) -> PathBuf {
    store_directory.join(".ignorelength")
}

/// Check whether length verification is suppressed for a store directory.
pub fn has_ignore_length(store_directory: &Path) -> bool {
    ignore_length_path(store_directory).is_file()
}

/// Write the marker suppressing length verification.
pub fn write_ignore_length(store_directory: &Path) -> Result<()> {
    let path = ignore_length_path(store_directory);
    fs::write(&path, "")
        .with_context(|| format!("Failed to write ignore-length marker: {}", path.display()))?;
    Ok(())
}

/// Path of the advisory lock file for a VOD id.
pub fn lock_path(config_dir: &Path, vod_id: u64) -> PathBuf {
    config_dir.join(format!(".lock.{}", vod_id))
}

/// Create the advisory lock for a VOD.
///
/// Returns true if the lock was already held by another run.
pub fn create_lock(config_dir: &Path, vod_id: u64) -> Result<bool> {
    let path = lock_path(config_dir, vod_id);
    match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
        Ok(_) => Ok(false),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(true),
        Err(e) => {
            Err(e).with_context(|| format!("Failed to create lock file: {}", path.display()))
        }
    }
}

/// Remove the advisory lock for a VOD.
pub fn remove_lock(config_dir: &Path, vod_id: u64) -> Result<()> {
    let path = lock_path(config_dir, vod_id);
    fs::remove_file(&path)
        .with_context(|| format!("Failed to remove lock file: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ignore_length_marker() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!has_ignore_length(dir.path()));
        write_ignore_length(dir.path()).unwrap();
        assert!(has_ignore_length(dir.path()));
    }

    #[test]
    fn test_lock_create_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!create_lock(dir.path(), 42).unwrap());
        // second acquisition reports the lock as held
        assert!(create_lock(dir.path(), 42).unwrap());
        remove_lock(dir.path(), 42).unwrap();
        assert!(!create_lock(dir.path(), 42).unwrap());
    }

    #[test]
    fn test_remove_missing_lock_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(remove_lock(dir.path(), 7).is_err());
    }
}
