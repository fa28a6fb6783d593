//! `jkb sources` – download, verify and install the kernel sources.

use anyhow::Result;
use jkb_core::config::JkbConfig;
use jkb_core::policy::{ConflictPolicy, PolicyResolver, Prompt};
use jkb_core::privilege::Privileged;
use jkb_core::workflow::{self, Outcome, WorkflowConfig};
use std::path::PathBuf;

pub fn run_sources(
    cfg: &JkbConfig,
    force_replace: bool,
    force_backup: bool,
    target: Option<PathBuf>,
    no_checksum: bool,
) -> Result<()> {
    let policy = ConflictPolicy::from_flags(force_replace, force_backup)?;
    let caps = Privileged::acquire()?;

    let mut wf = WorkflowConfig::from(cfg);
    if let Some(target) = target {
        wf.target = target;
    }
    if no_checksum {
        wf.verify_checksum = false;
    }

    let mut prompt;
    let mut fixed;
    let resolver: &mut dyn PolicyResolver = match policy {
        Some(p) => {
            tracing::info!("conflict policy from flags: {}", p);
            fixed = p;
            &mut fixed
        }
        None => {
            prompt = Prompt::stdin();
            &mut prompt
        }
    };

    match workflow::acquire_sources(&wf, resolver, &caps)? {
        Outcome::Kept => {}
        Outcome::Installed {
            version,
            kernel_tree,
            backup,
        } => {
            if let Some(backup) = backup {
                tracing::info!("previous sources saved in {}", backup.display());
            }
            println!("L4T {} kernel sources installed in {}", version, kernel_tree.display());
        }
    }
    Ok(())
}
