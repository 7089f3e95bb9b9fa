//! Single-file blob store with atomic replacement.
//!
//! # Invariants
//! - `save` writes a sibling temp file and renames it over the target, so
//!   readers see either the old or the new blob.

use super::{StorageError, StoragePort, StorageResult};
use log::debug;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Blob persisted as one file on disk.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    path: PathBuf,
}

impl FileBlobStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|value| value.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> StorageError {
        debug!(
            "event=blob_io module=storage status=error store=file path={}",
            self.path.display()
        );
        StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl StoragePort for FileBlobStore {
    fn load(&self) -> StorageResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(self.io_error(&self.path, err)),
        }
    }

    fn save(&self, raw: &str) -> StorageResult<()> {
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| self.io_error(parent, err))?;
        }

        let temp_path = self.temp_path();
        fs::write(&temp_path, raw).map_err(|err| self.io_error(&temp_path, err))?;
        fs::rename(&temp_path, &self.path).map_err(|err| self.io_error(&self.path, err))?;
        Ok(())
    }
}
