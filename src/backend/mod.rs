//! Storage backend contracts.
//!
//! Backends produce and consume fully materialized keysets; the resolution
//! core never talks to them directly. Transform backends (filters that
//! rewrite the payload around an inner fetch/persist) run in two phases with
//! state carried in an opaque handle, and every temporary artifact is
//! securely erased on both success and failure paths.

pub mod file;

pub use file::FileBackend;

use crate::error::BackendError;
use crate::key::KeyName;
use crate::keyset::Keyset;
use std::any::Any;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Fetch/persist contract between storage and the rest of the system
pub trait Backend: Send + Sync {
    fn fetch(&self, root: &KeyName) -> Result<Keyset, BackendError>;
    fn persist(&self, root: &KeyName, ks: &Keyset) -> Result<(), BackendError>;
}

/// Two-phase contract for transform backends
///
/// `pre_*` prepares the transformed artifact and hands back state; `post_*`
/// completes the operation from that state. A state dropped without its
/// artifact being taken erases the artifact itself, so the failure path needs
/// no extra cleanup.
pub trait TransformBackend: Send + Sync {
    fn pre_fetch(&self, root: &KeyName) -> Result<TransformState, BackendError>;
    fn post_fetch(&self, state: TransformState, ks: Keyset) -> Result<Keyset, BackendError>;
    fn pre_persist(&self, root: &KeyName, ks: &Keyset) -> Result<TransformState, BackendError>;
    fn post_persist(&self, state: TransformState) -> Result<(), BackendError>;
}

/// Opaque per-backend state carried across the two phases
#[derive(Default)]
pub struct TransformState {
    artifact: Option<PathBuf>,
    payload: Option<Box<dyn Any + Send>>,
}

impl TransformState {
    pub fn new() -> Self {
        TransformState::default()
    }

    pub fn with_artifact(path: PathBuf) -> Self {
        TransformState {
            artifact: Some(path),
            payload: None,
        }
    }

    pub fn set_payload(&mut self, payload: Box<dyn Any + Send>) {
        self.payload = Some(payload);
    }

    pub fn payload(&self) -> Option<&(dyn Any + Send)> {
        self.payload.as_deref()
    }

    pub fn artifact(&self) -> Option<&Path> {
        self.artifact.as_deref()
    }

    /// Take ownership of the artifact path; erasure becomes the caller's job
    pub fn take_artifact(&mut self) -> Option<PathBuf> {
        self.artifact.take()
    }
}

impl Drop for TransformState {
    fn drop(&mut self) {
        if let Some(path) = self.artifact.take() {
            if path.exists() {
                if let Err(e) = secure_erase(&path) {
                    warn!(path = %path.display(), error = %e, "failed to erase temporary artifact");
                }
            }
        }
    }
}

/// Overwrite a file's full length with zeros, flush, then remove it.
pub fn secure_erase(path: &Path) -> std::io::Result<()> {
    let len = fs::metadata(path)?.len();
    let mut file = OpenOptions::new().write(true).open(path)?;
    let zeros = [0u8; 8192];
    let mut remaining = len;
    while remaining > 0 {
        let chunk = remaining.min(zeros.len() as u64) as usize;
        file.write_all(&zeros[..chunk])?;
        remaining -= chunk as u64;
    }
    file.sync_all()?;
    drop(file);
    debug!(path = %path.display(), bytes = len, "erased temporary file");
    fs::remove_file(path)
}
