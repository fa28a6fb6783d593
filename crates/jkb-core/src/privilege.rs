//! Elevated-access capability.
//!
//! Destructive filesystem operations on the installation target are only
//! reachable through a [`Privileged`] value, and each one is logged before it
//! runs so the log is a complete audit trail.

use crate::error::{JkbError, Result};
use std::fs;
use std::path::Path;

/// Proof that the process may mutate system source directories.
#[derive(Debug)]
pub struct Privileged {
    _private: (),
}

impl Privileged {
    /// Succeeds only when the effective uid is 0.
    #[cfg(unix)]
    pub fn acquire() -> Result<Self> {
        // SAFETY: geteuid has no preconditions and cannot fail.
        let euid = unsafe { libc::geteuid() };
        if euid != 0 {
            return Err(JkbError::Privilege);
        }
        Ok(Self { _private: () })
    }

    #[cfg(not(unix))]
    pub fn acquire() -> Result<Self> {
        Err(JkbError::Privilege)
    }

    /// Capability for callers that already hold the needed access to the
    /// paths they pass in (scratch directories, tests).
    pub fn assume_granted() -> Self {
        Self { _private: () }
    }

    /// Recursively delete a directory tree.
    pub fn remove_tree(&self, path: &Path) -> Result<()> {
        tracing::warn!("removing {}", path.display());
        fs::remove_dir_all(path).map_err(|e| JkbError::io(format!("remove {}", path.display()), e))
    }

    /// Remove a single file.
    pub fn remove_file(&self, path: &Path) -> Result<()> {
        tracing::info!("removing {}", path.display());
        fs::remove_file(path).map_err(|e| JkbError::io(format!("remove {}", path.display()), e))
    }

    /// Rename `from` to `to` (same filesystem).
    pub fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        tracing::warn!("moving {} to {}", from.display(), to.display());
        fs::rename(from, to).map_err(|e| {
            JkbError::io(format!("move {} to {}", from.display(), to.display()), e)
        })
    }

    pub fn create_dir_all(&self, path: &Path) -> Result<()> {
        tracing::debug!("creating {}", path.display());
        fs::create_dir_all(path).map_err(|e| JkbError::io(format!("create {}", path.display()), e))
    }

    /// Write `contents` to `path`, replacing it.
    pub fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        tracing::info!("writing {} ({} bytes)", path.display(), contents.len());
        fs::write(path, contents).map_err(|e| JkbError::io(format!("write {}", path.display()), e))
    }

    pub fn copy(&self, from: &Path, to: &Path) -> Result<()> {
        tracing::info!("copying {} to {}", from.display(), to.display());
        fs::copy(from, to)
            .map(|_| ())
            .map_err(|e| JkbError::io(format!("copy {} to {}", from.display(), to.display()), e))
    }
}
