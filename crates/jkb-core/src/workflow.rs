//! Source acquisition: resolve the L4T version, settle what happens to any
//! existing tree, download and verify the public sources, unpack the kernel,
//! out-of-tree module and display driver sources, and seed `.config`.
//!
//! Every step is fatal on error. Nothing is rolled back: a failure after
//! extraction has started can leave the target partially populated.

use crate::bundle::ArchiveBundle;
use crate::checksum;
use crate::config::JkbConfig;
use crate::download;
use crate::error::{JkbError, Result};
use crate::extract::{self, NESTED_ARCHIVES, NESTED_PREFIX};
use crate::kconfig;
use crate::policy::PolicyResolver;
use crate::privilege::Privileged;
use crate::release::{self, L4tVersion};
use crate::target::{InstallationTarget, Resolution};
use std::fs;
use std::path::{Path, PathBuf};

/// Everything the workflow reads, passed in explicitly.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub target: PathBuf,
    pub work_dir: PathBuf,
    pub release_file: PathBuf,
    pub url_template: String,
    pub verify_checksum: bool,
    pub running_config: PathBuf,
    pub running_release: PathBuf,
    /// Kernel source tree relative to `target`.
    pub kernel_tree: PathBuf,
    pub set_localversion: bool,
}

impl From<&JkbConfig> for WorkflowConfig {
    fn from(cfg: &JkbConfig) -> Self {
        Self {
            target: cfg.target_dir.clone(),
            work_dir: cfg.work_dir.clone(),
            release_file: cfg.release_file.clone(),
            url_template: cfg.url_template.clone(),
            verify_checksum: cfg.verify_checksum,
            running_config: cfg.running_config.clone(),
            running_release: cfg.running_release.clone(),
            kernel_tree: cfg.kernel_tree.clone(),
            set_localversion: cfg.set_localversion,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The user kept the existing sources; nothing changed.
    Kept,
    Installed {
        version: L4tVersion,
        kernel_tree: PathBuf,
        /// Where a previous tree was moved, if it was backed up.
        backup: Option<PathBuf>,
    },
}

/// Run the whole workflow.
pub fn acquire_sources(
    cfg: &WorkflowConfig,
    resolver: &mut dyn PolicyResolver,
    caps: &Privileged,
) -> Result<Outcome> {
    let version = L4tVersion::from_file(&cfg.release_file)?;
    let url = version.source_url(&cfg.url_template);
    tracing::info!("L4T {} sources: {}", version, url);
    let bundle = ArchiveBundle::new(&url, cfg.verify_checksum, &cfg.work_dir)?;

    let target = InstallationTarget::new(&cfg.target);
    let backup = match target.resolve_conflict(resolver, caps, &chrono::Local::now())? {
        Resolution::Keep => return Ok(Outcome::Kept),
        Resolution::Proceed => None,
        Resolution::BackedUp(path) => Some(path),
    };

    caps.create_dir_all(&cfg.work_dir)?;
    fetch_bundle(&bundle)?;
    verify_bundle(&bundle)?;

    let nested = extract::extract_members(
        &bundle.archive,
        NESTED_PREFIX,
        &NESTED_ARCHIVES,
        &cfg.work_dir,
    )?;
    for archive in &nested {
        extract::unpack_into(caps, archive, target.root())?;
    }

    cleanup(caps, nested.iter().map(PathBuf::as_path).chain(bundle.local_files()));

    let kernel_tree = cfg.target.join(&cfg.kernel_tree);
    configure(cfg, caps, &kernel_tree)?;

    tracing::info!("kernel sources ready in {}", kernel_tree.display());
    Ok(Outcome::Installed {
        version,
        kernel_tree,
        backup,
    })
}

fn fetch_bundle(bundle: &ArchiveBundle) -> Result<()> {
    download::fetch(&bundle.url, &bundle.archive)?;
    if let Some((url, path)) = &bundle.checksum {
        download::fetch(url, path)?;
    }
    Ok(())
}

fn verify_bundle(bundle: &ArchiveBundle) -> Result<()> {
    let Some((_, sidecar)) = &bundle.checksum else {
        tracing::info!("checksum verification disabled, skipping");
        return Ok(());
    };
    let text = fs::read_to_string(sidecar)
        .map_err(|e| JkbError::io(format!("read {}", sidecar.display()), e))?;
    checksum::verify_against_sidecar(&bundle.archive, &text)
}

/// Best effort: failures are logged and otherwise ignored.
fn cleanup<'a>(caps: &Privileged, files: impl Iterator<Item = &'a Path>) {
    for path in files {
        if let Err(e) = caps.remove_file(path) {
            tracing::warn!("cleanup: {}", e);
        }
    }
}

fn configure(cfg: &WorkflowConfig, caps: &Privileged, kernel_tree: &Path) -> Result<()> {
    let config = kconfig::seed_config(caps, &cfg.running_config, kernel_tree)?;
    if !cfg.set_localversion {
        return Ok(());
    }
    let running = release::running_release(&cfg.running_release)?;
    match release::local_version_suffix(&running) {
        Some(suffix) => kconfig::apply_local_version(caps, &config, suffix),
        None => {
            tracing::info!("running release {} has no local version suffix", running);
            Ok(())
        }
    }
}
