//! Logging init: every event goes to stderr and to an append-only log file
//! under the XDG state dir, formatted identically in both sinks.

use anyhow::Result;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::{self, FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

/// Which log file a run appends to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunType {
    Sources,
    Build,
}

impl RunType {
    pub fn file_name(self) -> &'static str {
        match self {
            RunType::Sources => "sources.log",
            RunType::Build => "build.log",
        }
    }
}

/// `2026-10-18 14:03:11 [ERROR] message key=value`
#[derive(Debug, Clone, Copy, Default)]
pub struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        write!(writer, "{} [{}] ", now, event.metadata().level())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Writer that is either a file or stderr (used when file clone fails).
enum FileOrStderr {
    File(std::fs::File),
    Stderr,
}

impl io::Write for FileOrStderr {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            FileOrStderr::File(f) => f.write(buf),
            FileOrStderr::Stderr => io::stderr().lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            FileOrStderr::File(f) => f.flush(),
            FileOrStderr::Stderr => io::stderr().lock().flush(),
        }
    }
}

struct FileMakeWriter(std::fs::File);

impl<'a> MakeWriter<'a> for FileMakeWriter {
    type Writer = FileOrStderr;

    fn make_writer(&'a self) -> Self::Writer {
        self.0
            .try_clone()
            .map(FileOrStderr::File)
            .unwrap_or(FileOrStderr::Stderr)
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Default log directory: `~/.local/state/jkb/logs`.
pub fn default_log_dir() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("jkb")?;
    Ok(xdg_dirs.get_state_home().join("logs"))
}

/// Initialize dual-sink logging for `run_type`, appending to
/// `<log_dir>/<run-type>.log`. Returns the log file path.
/// On failure (e.g. log dir unwritable), returns Err so the caller can fall back to stderr.
pub fn init_logging(run_type: RunType, log_dir: Option<&Path>) -> Result<PathBuf> {
    let log_dir = match log_dir {
        Some(dir) => dir.to_path_buf(),
        None => default_log_dir()?,
    };

    fs::create_dir_all(&log_dir)?;
    let log_file_path = log_dir.join(run_type.file_name());

    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)?;

    let writer: BoxMakeWriter = BoxMakeWriter::new(FileMakeWriter(file));

    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            fmt::layer()
                .event_format(LineFormat)
                .with_writer(io::stderr)
                .with_ansi(false),
        )
        .with(
            fmt::layer()
                .event_format(LineFormat)
                .with_writer(writer)
                .with_ansi(false),
        )
        .init();

    tracing::debug!("logging to {}", log_file_path.display());

    Ok(log_file_path)
}

/// Stderr-only subscriber, for scoped use before the global one is installed.
pub fn stderr_subscriber() -> impl Subscriber + Send + Sync + 'static {
    tracing_subscriber::registry().with(env_filter()).with(
        fmt::layer()
            .event_format(LineFormat)
            .with_writer(io::stderr)
            .with_ansi(false),
    )
}

/// Initialize logging to stderr only (no file). Used by commands that keep no
/// log and when init_logging() fails so the CLI doesn't crash.
pub fn init_logging_stderr() {
    stderr_subscriber().init();
}
