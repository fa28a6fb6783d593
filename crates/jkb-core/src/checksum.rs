//! Archive checksums and `sha1sum`-style sidecar verification.
//!
//! Digests are computed after the download completes, reading the file in
//! chunks so memory use stays bounded for multi-gigabyte source archives.

use crate::error::{JkbError, Result};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const BUF_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Sha1,
    Sha256,
}

impl Algorithm {
    /// Pick the algorithm from the length of a hex digest.
    pub fn from_hex_len(len: usize) -> Option<Self> {
        match len {
            40 => Some(Algorithm::Sha1),
            64 => Some(Algorithm::Sha256),
            _ => None,
        }
    }
}

fn digest_path<D: Digest>(path: &Path) -> Result<String> {
    let mut f = File::open(path).map_err(|e| JkbError::io(format!("open {}", path.display()), e))?;
    let mut hasher = D::new();
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = f
            .read(&mut buf)
            .map_err(|e| JkbError::io(format!("read {}", path.display()), e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Compute SHA-256 of a file and return the digest as lowercase hex.
pub fn sha256_path(path: &Path) -> Result<String> {
    digest_path::<Sha256>(path)
}

/// Compute SHA-1 of a file and return the digest as lowercase hex.
pub fn sha1_path(path: &Path) -> Result<String> {
    digest_path::<Sha1>(path)
}

pub fn digest(path: &Path, algorithm: Algorithm) -> Result<String> {
    match algorithm {
        Algorithm::Sha1 => sha1_path(path),
        Algorithm::Sha256 => sha256_path(path),
    }
}

/// First whitespace-delimited token of a sidecar (`<hex>  <file name>`).
pub fn sidecar_digest(sidecar: &str) -> Option<&str> {
    sidecar.split_whitespace().next()
}

/// Verify `archive` against the contents of a checksum sidecar.
///
/// The comparison is case-insensitive. On mismatch the archive is left where it is.
pub fn verify_against_sidecar(archive: &Path, sidecar: &str) -> Result<()> {
    let expected = sidecar_digest(sidecar).unwrap_or("").to_ascii_lowercase();
    let algorithm = Algorithm::from_hex_len(expected.len())
        .filter(|_| expected.bytes().all(|b| b.is_ascii_hexdigit()));
    let actual = match algorithm {
        Some(a) => digest(archive, a)?,
        // Unusable sidecar: still report what the archive hashes to.
        None => sha1_path(archive)?,
    };
    if algorithm.is_none() || actual != expected {
        return Err(JkbError::ChecksumMismatch {
            path: archive.to_path_buf(),
            expected,
            actual,
        });
    }
    tracing::info!("checksum verified for {}: {}", archive.display(), actual);
    Ok(())
}
