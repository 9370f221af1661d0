//! Staging directory ownership
//!
//! A directory Folio created is removed when its [`StagingDir`] goes out of
//! scope, on every exit path. A directory the caller supplied is never
//! removed.

use crate::domain::{FolioError, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Name prefix of temporary staging directories
pub const TEMP_PREFIX: &str = "folio";

/// Guard over the directory that holds the staging store
#[derive(Debug)]
pub struct StagingDir {
    path: PathBuf,
    temp: Option<TempDir>,
}

impl StagingDir {
    /// Create a fresh `folio-<YYYYMMDDHHMMSS>-<random>` directory under the
    /// system temp dir
    pub fn temporary() -> Result<Self> {
        Self::temporary_in(&std::env::temp_dir())
    }

    /// Create a fresh temporary directory under `parent`
    pub fn temporary_in(parent: &Path) -> Result<Self> {
        let prefix = format!("{TEMP_PREFIX}-{}-", Utc::now().format("%Y%m%d%H%M%S"));
        let temp = tempfile::Builder::new()
            .prefix(&prefix)
            .tempdir_in(parent)
            .map_err(|e| {
                FolioError::Storage(format!(
                    "cannot create staging directory in {}: {e}",
                    parent.display()
                ))
            })?;
        Ok(Self {
            path: temp.path().to_path_buf(),
            temp: Some(temp),
        })
    }

    /// Use a caller-supplied directory as-is
    pub fn existing(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            temp: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the directory is removed when the guard is dropped
    pub fn is_temporary(&self) -> bool {
        self.temp.is_some()
    }

    /// Keep the directory on disk and return its path
    pub fn persist(mut self) -> PathBuf {
        if let Some(temp) = self.temp.take() {
            let _ = temp.keep();
        }
        std::mem::take(&mut self.path)
    }

    /// Remove a temporary directory now, logging failures
    ///
    /// Does nothing for a caller-supplied directory.
    pub fn cleanup(mut self) {
        if let Some(temp) = self.temp.take() {
            let path = temp.path().to_path_buf();
            match temp.close() {
                Ok(()) => tracing::debug!(path = %path.display(), "Removed staging directory"),
                Err(e) => tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to remove staging directory"
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temporary_is_removed_on_drop() {
        let parent = TempDir::new().unwrap();
        let dir = StagingDir::temporary_in(parent.path()).unwrap();
        let path = dir.path().to_path_buf();

        assert!(dir.is_temporary());
        assert!(path.exists());
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("folio-"));
        // folio-YYYYMMDDHHMMSS-
        assert_eq!(name.as_bytes()[20], b'-');

        drop(dir);
        assert!(!path.exists());
    }

    #[test]
    fn test_persist_keeps_directory() {
        let parent = TempDir::new().unwrap();
        let dir = StagingDir::temporary_in(parent.path()).unwrap();
        let path = dir.persist();
        assert!(path.exists());
    }

    #[test]
    fn test_cleanup_removes_temporary() {
        let parent = TempDir::new().unwrap();
        let dir = StagingDir::temporary_in(parent.path()).unwrap();
        let path = dir.path().to_path_buf();
        dir.cleanup();
        assert!(!path.exists());
    }

    #[test]
    fn test_existing_is_never_removed() {
        let parent = TempDir::new().unwrap();
        let dir = StagingDir::existing(parent.path());
        assert!(!dir.is_temporary());
        dir.cleanup();
        assert!(parent.path().exists());

        let dir = StagingDir::existing(parent.path());
        drop(dir);
        assert!(parent.path().exists());
    }
}
