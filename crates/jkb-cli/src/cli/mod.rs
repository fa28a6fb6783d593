//! CLI for the Jetson kernel source toolkit.

mod commands;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use jkb_core::config::JkbConfig;
use jkb_core::logging::RunType;
use std::path::PathBuf;

use commands::{
    run_build, run_checksum, run_completions, run_info, run_module_script, run_sources,
};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "jkb", version)]
#[command(about = "Fetch, verify and build NVIDIA Jetson (L4T) kernel sources", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download and install the kernel sources matching this board's L4T release.
    Sources {
        /// Delete existing sources without asking.
        #[arg(long, conflicts_with = "force_backup")]
        force_replace: bool,
        /// Move existing sources to a timestamped backup without asking.
        #[arg(long)]
        force_backup: bool,
        /// Installation directory (default from config, usually /usr/src/kernel).
        #[arg(long, value_name = "DIR")]
        target: Option<PathBuf>,
        /// Skip fetching and checking the .sha1sum sidecar.
        #[arg(long)]
        no_checksum: bool,
    },

    /// Run make in the installed kernel tree.
    Build {
        /// Parallel jobs (default: config `make_jobs`, else CPU count).
        #[arg(long, short = 'j', value_name = "N")]
        jobs: Option<usize>,
        /// Make targets, e.g. `Image modules`.
        targets: Vec<String>,
    },

    /// Show the detected L4T release, download URL and kernel tree state.
    Info,

    /// Print (or write) an install script for an out-of-tree module.
    ModuleScript {
        /// Module name, with or without `.ko`.
        module: String,
        /// Destination below /lib/modules/<release>/kernel/, e.g. drivers/usb/serial.
        subpath: String,
        /// Write the script here (mode 0755) instead of stdout.
        #[arg(long, short = 'o', value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Compute SHA-256 (or SHA-1) of a file, or check it against a sidecar.
    Checksum {
        /// Path to the file.
        path: PathBuf,
        /// Use SHA-1 instead of SHA-256.
        #[arg(long, conflicts_with = "against")]
        sha1: bool,
        /// Verify against a `<digest>  <name>` sidecar file instead of printing.
        #[arg(long, value_name = "SIDECAR")]
        against: Option<PathBuf>,
    },

    /// Generate shell completions.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Process exit status for a parse failure: 0 for `--help`/`--version`,
/// 1 for every usage error (clap itself would use 2).
pub fn exit_code(err: &clap::Error) -> i32 {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

impl CliCommand {
    /// Commands that keep a log file, and which one.
    pub fn run_type(&self) -> Option<RunType> {
        match self {
            CliCommand::Sources { .. } => Some(RunType::Sources),
            CliCommand::Build { .. } => Some(RunType::Build),
            _ => None,
        }
    }

    pub fn run(self, cfg: &JkbConfig) -> Result<()> {
        tracing::debug!("loaded config: {:?}", cfg);
        match self {
            CliCommand::Sources {
                force_replace,
                force_backup,
                target,
                no_checksum,
            } => run_sources(cfg, force_replace, force_backup, target, no_checksum)?,
            CliCommand::Build { jobs, targets } => run_build(cfg, jobs, targets)?,
            CliCommand::Info => run_info(cfg)?,
            CliCommand::ModuleScript {
                module,
                subpath,
                output,
            } => run_module_script(&module, &subpath, output.as_deref())?,
            CliCommand::Checksum { path, sha1, against } => {
                run_checksum(&path, sha1, against.as_deref())?
            }
            CliCommand::Completions { shell } => run_completions(shell),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
