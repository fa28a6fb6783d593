//! CLI command handlers, one file per command.

mod build;
mod checksum;
mod completions;
mod info;
mod module_script;
mod sources;

pub use build::run_build;
pub use checksum::run_checksum;
pub use completions::run_completions;
pub use info::run_info;
pub use module_script::run_module_script;
pub use sources::run_sources;
