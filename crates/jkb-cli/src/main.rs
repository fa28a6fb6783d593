use clap::Parser;
use jkb_core::config;
use jkb_core::logging;

mod cli;

use crate::cli::{exit_code, Cli};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(exit_code(&e));
        }
    };

    // The global subscriber depends on the config (log_dir), so config
    // loading logs through a scoped stderr one.
    let loaded = tracing::subscriber::with_default(logging::stderr_subscriber(), || {
        config::load_or_init().inspect_err(|err| tracing::error!("{:#}", err))
    });
    let Ok(cfg) = loaded else {
        std::process::exit(1);
    };

    match cli.command.run_type() {
        Some(run_type) => {
            if let Err(e) = logging::init_logging(run_type, cfg.log_dir.as_deref()) {
                logging::init_logging_stderr();
                tracing::warn!("log file unavailable ({:#}), logging to stderr only", e);
            }
        }
        None => logging::init_logging_stderr(),
    }

    if let Err(err) = cli.command.run(&cfg) {
        tracing::error!("{:#}", err);
        std::process::exit(1);
    }
}
