//! Seed a kernel tree's `.config` from the running system.

use crate::error::{JkbError, Result};
use crate::privilege::Privileged;
use flate2::read::GzDecoder;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

pub const LOCALVERSION_KEY: &str = "CONFIG_LOCALVERSION";

/// Set `key` to `value` in kconfig text.
///
/// Replaces an existing `KEY=...` or `# KEY is not set` line in place, or
/// appends one. Applying the same assignment twice yields the same text.
pub fn set_config_value(config: &str, key: &str, value: &str) -> String {
    let assignment = format!("{key}={value}");
    let unset = format!("# {key} is not set");
    let prefix = format!("{key}=");

    let mut replaced = false;
    let mut out = String::with_capacity(config.len() + assignment.len() + 1);
    for line in config.lines() {
        if line.starts_with(&prefix) || line.trim_end() == unset {
            if !replaced {
                out.push_str(&assignment);
                out.push('\n');
                replaced = true;
            }
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }
    if !replaced {
        out.push_str(&assignment);
        out.push('\n');
    }
    out
}

/// Quote a string value the way kconfig writes it.
pub fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Decompress the running kernel's configuration (e.g. `/proc/config.gz`).
pub fn read_running_config(path: &Path) -> Result<Vec<u8>> {
    let file =
        fs::File::open(path).map_err(|e| JkbError::io(format!("open {}", path.display()), e))?;
    let mut data = Vec::new();
    GzDecoder::new(file)
        .read_to_end(&mut data)
        .map_err(|e| JkbError::io(format!("decompress {}", path.display()), e))?;
    Ok(data)
}

/// Write the running configuration into `tree/.config` and keep a pristine
/// `tree/.config.orig` copy. Returns the path of `.config`.
pub fn seed_config(caps: &Privileged, running_config: &Path, tree: &Path) -> Result<PathBuf> {
    if !tree.is_dir() {
        return Err(JkbError::io(
            format!("kernel tree {}", tree.display()),
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found after extraction"),
        ));
    }
    let data = read_running_config(running_config)?;
    let config = tree.join(".config");
    caps.write(&config, &data)?;
    caps.copy(&config, &tree.join(".config.orig"))?;
    Ok(config)
}

/// Set `CONFIG_LOCALVERSION` in `config` to the given suffix.
pub fn apply_local_version(caps: &Privileged, config: &Path, suffix: &str) -> Result<()> {
    let text = fs::read_to_string(config)
        .map_err(|e| JkbError::io(format!("read {}", config.display()), e))?;
    let updated = set_config_value(&text, LOCALVERSION_KEY, &quoted(suffix));
    if updated == text {
        tracing::info!("{}=\"{}\" already set", LOCALVERSION_KEY, suffix);
        return Ok(());
    }
    tracing::info!("setting {}=\"{}\" in {}", LOCALVERSION_KEY, suffix, config.display());
    caps.write(config, updated.as_bytes())
}
