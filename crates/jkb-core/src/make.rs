//! Kernel build invocation.
//!
//! Runs `make -j<N> [targets]` in the kernel tree. Each output line is logged,
//! so it reaches both the terminal and the build log. A failed parallel build
//! is retried once with `-j1`, which usually surfaces the real error last.

use crate::error::{JkbError, Result};
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;

#[derive(Debug, Clone)]
pub struct MakeInvocation {
    /// Program to run; `make` unless overridden.
    pub program: PathBuf,
    /// Directory make runs in.
    pub tree: PathBuf,
    pub jobs: usize,
    pub targets: Vec<String>,
}

impl MakeInvocation {
    pub fn new(tree: impl Into<PathBuf>, jobs: Option<usize>, targets: Vec<String>) -> Self {
        Self {
            program: PathBuf::from("make"),
            tree: tree.into(),
            jobs: jobs.unwrap_or_else(default_jobs).max(1),
            targets,
        }
    }

    fn describe(&self, jobs: usize) -> String {
        let mut s = format!("{} -j{}", self.program.display(), jobs);
        for t in &self.targets {
            s.push(' ');
            s.push_str(t);
        }
        s
    }
}

/// Number of CPUs available to this process.
pub fn default_jobs() -> usize {
    thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

fn pump<R: Read>(reader: R, stream: &'static str) {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                tracing::info!(target: "jkb_core::make", "{}", line.trim_end());
            }
            Err(e) => {
                tracing::warn!("reading make {}: {}", stream, e);
                break;
            }
        }
    }
}

fn run_once(inv: &MakeInvocation, jobs: usize) -> Result<()> {
    let cmdline = inv.describe(jobs);
    tracing::info!("running `{}` in {}", cmdline, inv.tree.display());

    let mut child = Command::new(&inv.program)
        .arg(format!("-j{}", jobs))
        .args(&inv.targets)
        .current_dir(&inv.tree)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| JkbError::io(format!("spawn {}", inv.program.display()), e))?;

    let stderr_pump = child
        .stderr
        .take()
        .map(|stderr| thread::spawn(move || pump(stderr, "stderr")));
    if let Some(stdout) = child.stdout.take() {
        pump(stdout, "stdout");
    }
    if let Some(handle) = stderr_pump {
        let _ = handle.join();
    }

    let status = child
        .wait()
        .map_err(|e| JkbError::io(format!("wait for {}", inv.program.display()), e))?;
    if !status.success() {
        return Err(JkbError::Build(format!("`{}` exited with {}", cmdline, status)));
    }
    tracing::info!("`{}` finished", cmdline);
    Ok(())
}

/// Run the build, retrying once single-threaded if the first attempt fails.
pub fn run_make(inv: &MakeInvocation) -> Result<()> {
    match run_once(inv, inv.jobs) {
        Ok(()) => Ok(()),
        Err(JkbError::Build(msg)) if inv.jobs > 1 => {
            tracing::warn!("{}; retrying with -j1", msg);
            run_once(inv, 1)
        }
        Err(e) => Err(e),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    /// Fake `make` that records its arguments and fails unless run with `-j1`.
    fn fake_make(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake-make");
        let script = format!(
            "#!/bin/sh\necho \"$@\" >> \"{}/calls\"\n{}\n",
            dir.display(),
            body
        );
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn invocation(dir: &Path, program: PathBuf, jobs: usize) -> MakeInvocation {
        MakeInvocation {
            program,
            tree: dir.to_path_buf(),
            jobs,
            targets: vec!["Image".to_string(), "modules".to_string()],
        }
    }

    fn calls(dir: &Path) -> Vec<String> {
        fs::read_to_string(dir.join("calls"))
            .unwrap()
            .lines()
            .map(String::from)
            .collect()
    }

    #[test]
    fn success_runs_once() {
        let dir = tempfile::tempdir().unwrap();
        let prog = fake_make(dir.path(), "echo building; exit 0");
        run_make(&invocation(dir.path(), prog, 4)).unwrap();
        assert_eq!(calls(dir.path()), vec!["-j4 Image modules"]);
    }

    #[test]
    fn failure_retries_single_threaded() {
        let dir = tempfile::tempdir().unwrap();
        let prog = fake_make(dir.path(), "[ \"$1\" = \"-j1\" ] || { echo boom >&2; exit 2; }");
        run_make(&invocation(dir.path(), prog, 8)).unwrap();
        assert_eq!(calls(dir.path()), vec!["-j8 Image modules", "-j1 Image modules"]);
    }

    #[test]
    fn second_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let prog = fake_make(dir.path(), "exit 1");
        match run_make(&invocation(dir.path(), prog, 2)) {
            Err(JkbError::Build(msg)) => assert!(msg.contains("-j1")),
            other => panic!("expected Build error, got {other:?}"),
        }
        assert_eq!(calls(dir.path()).len(), 2);
    }

    #[test]
    fn single_job_failure_is_not_retried() {
        let dir = tempfile::tempdir().unwrap();
        let prog = fake_make(dir.path(), "exit 1");
        assert!(run_make(&invocation(dir.path(), prog, 1)).is_err());
        assert_eq!(calls(dir.path()).len(), 1);
    }

    #[test]
    fn missing_program_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let inv = invocation(dir.path(), dir.path().join("no-such-make"), 2);
        assert!(matches!(run_make(&inv), Err(JkbError::Io { .. })));
    }

    #[test]
    fn new_clamps_jobs() {
        let inv = MakeInvocation::new("/usr/src/kernel", Some(0), vec![]);
        assert_eq!(inv.jobs, 1);
        assert_eq!(inv.program, PathBuf::from("make"));
        assert_eq!(inv.describe(3), "make -j3");
    }
}
