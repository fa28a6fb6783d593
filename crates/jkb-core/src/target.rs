//! Installation target detection and conflict resolution.

use crate::error::{JkbError, Result};
use crate::policy::{ConflictPolicy, PolicyResolver};
use crate::privilege::Privileged;
use chrono::{DateTime, TimeZone};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Timestamp format of backup suffixes, e.g. `20261018_140311`.
pub const BACKUP_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Directory the kernel sources are extracted into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallationTarget {
    root: PathBuf,
}

/// Whether the workflow should continue after conflict resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Nothing was there, or the old tree was removed.
    Proceed,
    /// The old tree was moved to the given path.
    BackedUp(PathBuf),
    /// The user kept the existing tree; stop without changes.
    Keep,
}

impl InstallationTarget {
    /// Redundant separators and `.` components are dropped, so `kernel/` and
    /// `kernel` name the same target.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root: PathBuf = root.into();
        Self {
            root: root.components().collect(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// True when the target is a directory with at least one entry.
    pub fn has_sources(&self) -> bool {
        fs::read_dir(&self.root)
            .map(|mut entries| entries.next().is_some())
            .unwrap_or(false)
    }

    /// `<target>_backup_<stamp>` next to the target.
    pub fn backup_path<Tz>(&self, now: &DateTime<Tz>) -> PathBuf
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let mut name: OsString = self.root.as_os_str().to_owned();
        name.push(format!("_backup_{}", now.format(BACKUP_STAMP_FORMAT)));
        PathBuf::from(name)
    }

    /// Apply the conflict policy if the target already holds a source tree.
    ///
    /// The resolver is only consulted when there is something to resolve.
    pub fn resolve_conflict<Tz>(
        &self,
        resolver: &mut dyn PolicyResolver,
        caps: &Privileged,
        now: &DateTime<Tz>,
    ) -> Result<Resolution>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        if !self.has_sources() {
            tracing::info!("no existing sources at {}", self.root.display());
            return Ok(Resolution::Proceed);
        }

        tracing::info!("existing sources found at {}", self.root.display());
        match resolver.resolve(&self.root)? {
            ConflictPolicy::Keep => {
                tracing::info!("keeping existing sources at {}", self.root.display());
                Ok(Resolution::Keep)
            }
            ConflictPolicy::Replace => {
                caps.remove_tree(&self.root)?;
                Ok(Resolution::Proceed)
            }
            ConflictPolicy::Backup => {
                let backup = self.backup_path(now);
                if backup.exists() {
                    return Err(JkbError::BackupCollision { path: backup });
                }
                caps.rename(&self.root, &backup)?;
                tracing::info!("existing sources backed up to {}", backup.display());
                Ok(Resolution::BackedUp(backup))
            }
        }
    }
}
