pub mod config;
pub mod error;
pub mod logging;

pub mod bundle;
pub mod checksum;
pub mod download;
pub mod extract;
pub mod fetch_head;
pub mod kconfig;
pub mod make;
pub mod module_script;
pub mod policy;
pub mod privilege;
pub mod release;
pub mod target;
pub mod workflow;

pub use error::{JkbError, Result};
