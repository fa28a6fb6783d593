use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Where NVIDIA publishes the public sources for an L4T release.
pub const DEFAULT_URL_TEMPLATE: &str =
    "https://developer.nvidia.com/downloads/embedded/l4t/r{major}_release_v{minor}/sources/public_sources.tbz2";

/// Global configuration loaded from `~/.config/jkb/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JkbConfig {
    /// Installation target populated with the extracted sources.
    pub target_dir: PathBuf,
    /// Directory the archives are downloaded to and unpacked in.
    pub work_dir: PathBuf,
    /// L4T release descriptor providing the version tokens.
    pub release_file: PathBuf,
    /// Download URL with `{major}` and `{minor}` placeholders.
    pub url_template: String,
    /// Fetch `<archive>.sha1sum` and verify the archive against it.
    pub verify_checksum: bool,
    /// Compressed configuration of the running kernel.
    pub running_config: PathBuf,
    /// Release string of the running kernel (what `uname -r` prints).
    pub running_release: PathBuf,
    /// Kernel source tree, relative to `target_dir`.
    pub kernel_tree: PathBuf,
    /// Write CONFIG_LOCALVERSION derived from the running release.
    pub set_localversion: bool,
    /// Parallel make jobs (None = available parallelism).
    #[serde(default)]
    pub make_jobs: Option<usize>,
    /// Override for the log directory (None = XDG state dir).
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl Default for JkbConfig {
    fn default() -> Self {
        Self {
            target_dir: PathBuf::from("/usr/src/kernel"),
            work_dir: PathBuf::from("/usr/src"),
            release_file: PathBuf::from("/etc/nv_tegra_release"),
            url_template: DEFAULT_URL_TEMPLATE.to_string(),
            verify_checksum: true,
            running_config: PathBuf::from("/proc/config.gz"),
            running_release: PathBuf::from("/proc/sys/kernel/osrelease"),
            kernel_tree: PathBuf::from("kernel/kernel-jammy-src"),
            set_localversion: true,
            make_jobs: None,
            log_dir: None,
        }
    }
}

impl JkbConfig {
    /// Absolute path of the kernel source tree inside the target.
    pub fn kernel_tree_path(&self) -> PathBuf {
        self.target_dir.join(&self.kernel_tree)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("jkb")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<JkbConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = JkbConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: JkbConfig = toml::from_str(&data)?;
    Ok(cfg)
}
