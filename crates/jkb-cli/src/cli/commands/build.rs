//! `jkb build` – run make in the installed kernel tree.

use anyhow::{bail, Result};
use jkb_core::config::JkbConfig;
use jkb_core::make::{self, MakeInvocation};
use jkb_core::privilege::Privileged;

pub fn run_build(cfg: &JkbConfig, jobs: Option<usize>, targets: Vec<String>) -> Result<()> {
    let _caps = Privileged::acquire()?;
    let tree = cfg.kernel_tree_path();
    if !tree.join("Makefile").is_file() {
        bail!(
            "no kernel tree at {}; run `jkb sources` first",
            tree.display()
        );
    }
    let inv = MakeInvocation::new(tree, jobs.or(cfg.make_jobs), targets);
    make::run_make(&inv)?;
    Ok(())
}
