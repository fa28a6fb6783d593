//! `jkb module-script` – emit an install script for an out-of-tree module.

use anyhow::{Context, Result};
use jkb_core::module_script;
use std::fs;
use std::path::Path;

pub fn run_module_script(module: &str, subpath: &str, output: Option<&Path>) -> Result<()> {
    let script = module_script::generate(module, subpath)?;
    let Some(output) = output else {
        print!("{}", script);
        return Ok(());
    };

    fs::write(output, &script).with_context(|| format!("write {}", output.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(output, fs::Permissions::from_mode(0o755))
            .with_context(|| format!("chmod {}", output.display()))?;
    }
    tracing::info!("wrote {}", output.display());
    Ok(())
}
