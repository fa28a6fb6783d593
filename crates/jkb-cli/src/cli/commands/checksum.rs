//! Checksum command: compute or verify a file digest.

use anyhow::{Context, Result};
use jkb_core::checksum::{self, Algorithm};
use std::fs;
use std::path::Path;

/// Print the digest of `path`, or verify it against a sidecar file.
pub fn run_checksum(path: &Path, sha1: bool, against: Option<&Path>) -> Result<()> {
    if let Some(sidecar) = against {
        let text = fs::read_to_string(sidecar)
            .with_context(|| format!("read {}", sidecar.display()))?;
        checksum::verify_against_sidecar(path, &text)?;
        println!("{}: OK", path.display());
        return Ok(());
    }

    let algorithm = if sha1 { Algorithm::Sha1 } else { Algorithm::Sha256 };
    let digest = checksum::digest(path, algorithm)?;
    println!("{}  {}", digest, path.display());
    Ok(())
}
