//! The remote archive and its optional checksum sidecar.

use crate::error::{JkbError, Result};
use std::path::{Path, PathBuf};

/// Appended to the archive URL to find its checksum.
pub const CHECKSUM_SUFFIX: &str = ".sha1sum";

/// Extracts the last path segment from a URL for use as a filename.
///
/// Returns `None` if the URL cannot be parsed or the path is empty/root.
pub fn filename_from_url_path(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.filter(|s| !s.is_empty()).last()?;
    if segment == "." || segment == ".." {
        return None;
    }
    Some(segment.to_string())
}

/// Archive URL plus where it (and its sidecar, if verification is on) lands locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveBundle {
    pub url: String,
    pub archive: PathBuf,
    /// Sidecar URL and local path; `None` when checksums are not verified.
    pub checksum: Option<(String, PathBuf)>,
}

impl ArchiveBundle {
    pub fn new(url: &str, with_checksum: bool, work_dir: &Path) -> Result<Self> {
        let name = filename_from_url_path(url).ok_or_else(|| JkbError::Download {
            url: url.to_string(),
            reason: "cannot derive a file name from the URL".to_string(),
        })?;
        let archive = work_dir.join(&name);
        let checksum = with_checksum.then(|| {
            (
                format!("{url}{CHECKSUM_SUFFIX}"),
                work_dir.join(format!("{name}{CHECKSUM_SUFFIX}")),
            )
        });
        Ok(Self {
            url: url.to_string(),
            archive,
            checksum,
        })
    }

    /// Local files this bundle creates.
    pub fn local_files(&self) -> impl Iterator<Item = &Path> {
        let sidecar = self.checksum.as_ref().map(|(_, p)| p.as_path());
        std::iter::once(self.archive.as_path()).chain(sidecar)
    }
}
