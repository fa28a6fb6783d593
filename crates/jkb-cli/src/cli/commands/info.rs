//! `jkb info` – what `jkb sources` would do on this board.

use anyhow::Result;
use jkb_core::config::JkbConfig;
use jkb_core::release::{self, L4tVersion};
use jkb_core::target::InstallationTarget;

pub fn run_info(cfg: &JkbConfig) -> Result<()> {
    let version = L4tVersion::from_file(&cfg.release_file)?;
    println!("{:<16} {}", "L4T release", version);
    println!("{:<16} {}", "Sources URL", version.source_url(&cfg.url_template));

    match release::running_release(&cfg.running_release) {
        Ok(running) => {
            let suffix = release::local_version_suffix(&running).unwrap_or("-");
            println!("{:<16} {}", "Running kernel", running);
            println!("{:<16} {}", "Local version", suffix);
        }
        Err(e) => tracing::warn!("{}", e),
    }

    let target = InstallationTarget::new(&cfg.target_dir);
    let state = if target.has_sources() {
        "present"
    } else {
        "absent"
    };
    println!("{:<16} {} ({})", "Target", target.root().display(), state);
    let tree = cfg.kernel_tree_path();
    let config = if tree.join(".config").is_file() {
        "configured"
    } else {
        "no .config"
    };
    println!("{:<16} {} ({})", "Kernel tree", tree.display(), config);
    Ok(())
}
