//! L4T release descriptor parsing and download URL derivation.
//!
//! `/etc/nv_tegra_release` starts with a line like
//! `# R36 (release), REVISION: 4.3, GCID: 38968081, BOARD: generic, EABI: aarch64, DATE: ...`.
//! The major version is the number after `R`, the minor version is the
//! `REVISION` token.

use crate::error::{JkbError, Result};
use regex::Regex;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

static MAJOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#\s*R(\d*)").unwrap());
static MINOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"REVISION:\s*([0-9][0-9.]*)?").unwrap());

/// L4T version tokens, e.g. major `36`, minor `4.3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct L4tVersion {
    pub major: String,
    pub minor: String,
}

impl fmt::Display for L4tVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}.{}", self.major, self.minor)
    }
}

impl L4tVersion {
    /// Parse the descriptor contents. The error string says which token is missing.
    pub fn parse(contents: &str) -> std::result::Result<Self, String> {
        let major = MAJOR_RE
            .captures(contents)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "major version (R<n>) not found".to_string())?;
        let minor = MINOR_RE
            .captures(contents)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim_end_matches('.'))
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "REVISION token not found".to_string())?;
        Ok(Self {
            major: major.to_string(),
            minor: minor.to_string(),
        })
    }

    /// Read and parse the descriptor at `path`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| JkbError::VersionParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::parse(&contents).map_err(|reason| JkbError::VersionParse {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Substitute `{major}` and `{minor}` in `template`.
    pub fn source_url(&self, template: &str) -> String {
        template
            .replace("{major}", &self.major)
            .replace("{minor}", &self.minor)
    }
}

/// Local version suffix of a kernel release: everything from the first hyphen.
/// `5.15.148-tegra` gives `-tegra`; a release without a hyphen has none.
pub fn local_version_suffix(release: &str) -> Option<&str> {
    let release = release.trim();
    let idx = release.find('-')?;
    let suffix = &release[idx..];
    if suffix.len() > 1 {
        Some(suffix)
    } else {
        None
    }
}

/// Read the running kernel release (e.g. from `/proc/sys/kernel/osrelease`).
pub fn running_release(path: &Path) -> Result<String> {
    let s = fs::read_to_string(path)
        .map_err(|e| JkbError::io(format!("read {}", path.display()), e))?;
    Ok(s.trim().to_string())
}
