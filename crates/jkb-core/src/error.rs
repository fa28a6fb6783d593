//! Error taxonomy for the source acquisition workflow and its helpers.
//!
//! Every variant is fatal: callers log it and exit 1. Nothing here is retried.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JkbError {
    /// Bad command-line arguments.
    #[error("usage: {0}")]
    Usage(String),

    /// The process lacks elevated access (effective uid is not 0).
    #[error("this operation requires root privileges (try running with sudo)")]
    Privilege,

    /// The release descriptor is unreadable or not in the expected format.
    #[error("cannot read L4T version from {}: {reason}", path.display())]
    VersionParse { path: PathBuf, reason: String },

    /// Network or HTTP failure while fetching a resource.
    #[error("download of {url} failed: {reason}")]
    Download { url: String, reason: String },

    /// The archive digest does not match the sidecar. The archive is left on disk.
    #[error("checksum mismatch for {}: expected {expected}, got {actual}", path.display())]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// A top-level or nested archive could not be extracted.
    #[error("extraction of {} failed: {reason}", archive.display())]
    Extraction { archive: PathBuf, reason: String },

    /// The timestamped backup destination already exists.
    #[error("backup destination {} already exists; refusing to overwrite", path.display())]
    BackupCollision { path: PathBuf },

    /// Kernel build failed even after the single-threaded retry.
    #[error("kernel build failed: {0}")]
    Build(String),

    /// Module install script inputs were rejected.
    #[error("invalid module script input: {0}")]
    ModuleScript(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl JkbError {
    /// Wrap an I/O error with a short description of what was being attempted.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        JkbError::Io {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T, E = JkbError> = std::result::Result<T, E>;
