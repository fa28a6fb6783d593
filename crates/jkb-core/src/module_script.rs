//! Generates install scripts for out-of-tree kernel modules.

use crate::error::{JkbError, Result};

/// Validated inputs for an install script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSpec {
    /// Module name without `.ko`.
    pub name: String,
    /// Path below `/lib/modules/<release>/kernel/`, without surrounding slashes.
    pub subpath: String,
}

impl ModuleSpec {
    pub fn new(name: &str, subpath: &str) -> Result<Self> {
        let name = name.trim();
        let name = name.strip_suffix(".ko").unwrap_or(name);
        if name.is_empty() {
            return Err(JkbError::ModuleScript("module name is empty".to_string()));
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(JkbError::ModuleScript(format!(
                "module name {name:?} may only contain letters, digits, '_' and '-'"
            )));
        }

        let subpath = subpath.trim().trim_matches('/');
        if subpath.is_empty() {
            return Err(JkbError::ModuleScript("install subpath is empty".to_string()));
        }
        if subpath.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..") {
            return Err(JkbError::ModuleScript(format!(
                "install subpath {subpath:?} must be a plain relative path"
            )));
        }
        if subpath.chars().any(|c| c.is_whitespace() || c.is_control() || c == '"' || c == '$') {
            return Err(JkbError::ModuleScript(format!(
                "install subpath {subpath:?} contains characters that need quoting"
            )));
        }

        Ok(Self {
            name: name.to_string(),
            subpath: subpath.to_string(),
        })
    }
}

/// Render the install script for `spec`.
pub fn render(spec: &ModuleSpec) -> String {
    let ModuleSpec { name, subpath } = spec;
    format!(
        r#"#!/bin/bash
# Install the {name} kernel module into the running kernel's module tree.
set -e

MODULE="{name}"
KERNEL_RELEASE="$(uname -r)"
INSTALL_DIR="/lib/modules/${{KERNEL_RELEASE}}/kernel/{subpath}"
SCRIPT_DIR="$(cd "$(dirname "${{BASH_SOURCE[0]}}")" && pwd)"

if [ ! -f "${{SCRIPT_DIR}}/${{MODULE}}.ko" ]; then
    echo "[ERROR] ${{SCRIPT_DIR}}/${{MODULE}}.ko not found" >&2
    exit 1
fi

echo "Installing ${{MODULE}}.ko to ${{INSTALL_DIR}}"
sudo mkdir -p "${{INSTALL_DIR}}"
sudo cp -v "${{SCRIPT_DIR}}/${{MODULE}}.ko" "${{INSTALL_DIR}}/"
sudo depmod -a
sudo modprobe "${{MODULE}}"
echo "${{MODULE}} installed and loaded"
"#
    )
}

/// Validate inputs and render in one step.
pub fn generate(name: &str, subpath: &str) -> Result<String> {
    Ok(render(&ModuleSpec::new(name, subpath)?))
}
