//! File-based backend: reads and writes one file through a format plugin.

use crate::backend::{secure_erase, Backend};
use crate::error::BackendError;
use crate::format::Format;
use crate::key::KeyName;
use crate::keyset::Keyset;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Backend over a single file, parameterized by format
pub struct FileBackend {
    path: PathBuf,
    format: Box<dyn Format>,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>, format: Box<dyn Format>) -> Self {
        FileBackend {
            path: path.into(),
            format,
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Backend for FileBackend {
    fn fetch(&self, root: &KeyName) -> Result<Keyset, BackendError> {
        let bytes = fs::read(&self.path)?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "fetched payload");
        self.format.parse(&bytes, root)
    }

    /// Write through a staging file in the same directory and rename into
    /// place; a failed write leaves the original untouched and erases the
    /// staging file.
    fn persist(&self, _root: &KeyName, ks: &Keyset) -> Result<(), BackendError> {
        let bytes = self.format.write(ks)?;
        let staging = self.staging_path();
        let result = fs::write(&staging, &bytes)
            .and_then(|_| fs::rename(&staging, &self.path))
            .map_err(BackendError::from);
        if result.is_err() && staging.exists() {
            let _ = secure_erase(&staging);
        }
        if result.is_ok() {
            debug!(path = %self.path.display(), keys = ks.len(), "persisted keyset");
        }
        result
    }
}
