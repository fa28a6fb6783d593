//! What to do with an existing source tree: keep, replace, or back up.
//!
//! The decision comes from a [`PolicyResolver`]: a fixed policy when the user
//! passed `--force-replace` / `--force-backup`, or an interactive prompt.

use crate::error::{JkbError, Result};
use std::fmt;
use std::io::{self, BufRead, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Leave the existing tree alone and stop.
    Keep,
    /// Delete the existing tree.
    Replace,
    /// Move the existing tree to a timestamped sibling.
    Backup,
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConflictPolicy::Keep => "keep",
            ConflictPolicy::Replace => "replace",
            ConflictPolicy::Backup => "backup",
        })
    }
}

impl ConflictPolicy {
    /// Map the mutually exclusive force flags to a fixed policy.
    /// `None` means neither flag was given and the user should be asked.
    pub fn from_flags(force_replace: bool, force_backup: bool) -> Result<Option<Self>> {
        match (force_replace, force_backup) {
            (true, true) => Err(JkbError::Usage(
                "--force-replace and --force-backup are mutually exclusive".to_string(),
            )),
            (true, false) => Ok(Some(ConflictPolicy::Replace)),
            (false, true) => Ok(Some(ConflictPolicy::Backup)),
            (false, false) => Ok(None),
        }
    }
}

/// Interpret a prompt answer. Anything unrecognized keeps the existing sources.
pub fn parse_choice(input: &str) -> ConflictPolicy {
    match input.trim().to_ascii_lowercase().as_str() {
        "r" | "replace" => ConflictPolicy::Replace,
        "b" | "backup" => ConflictPolicy::Backup,
        _ => ConflictPolicy::Keep,
    }
}

/// Decides the conflict policy once an existing tree has been found.
pub trait PolicyResolver {
    fn resolve(&mut self, existing: &Path) -> Result<ConflictPolicy>;
}

/// A fixed policy resolves to itself without asking.
impl PolicyResolver for ConflictPolicy {
    fn resolve(&mut self, _existing: &Path) -> Result<ConflictPolicy> {
        Ok(*self)
    }
}

/// Asks on `output` and reads one line from `input`. Blocks until a line (or EOF) arrives.
pub struct Prompt<R, W> {
    input: R,
    output: W,
}

impl Prompt<io::StdinLock<'static>, io::Stdout> {
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> PolicyResolver for Prompt<R, W> {
    fn resolve(&mut self, existing: &Path) -> Result<ConflictPolicy> {
        let question = format!(
            "Kernel sources already exist at {}.\n[k]eep, [r]eplace or [b]ackup? [k]: ",
            existing.display()
        );
        self.output
            .write_all(question.as_bytes())
            .and_then(|_| self.output.flush())
            .map_err(|e| JkbError::io("write prompt", e))?;
        let mut line = String::new();
        self.input
            .read_line(&mut line)
            .map_err(|e| JkbError::io("read answer", e))?;
        let choice = parse_choice(&line);
        tracing::info!("user chose to {} existing sources", choice);
        Ok(choice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn parse_choice_letters_and_words() {
        assert_eq!(parse_choice("k\n"), ConflictPolicy::Keep);
        assert_eq!(parse_choice("R"), ConflictPolicy::Replace);
        assert_eq!(parse_choice(" backup "), ConflictPolicy::Backup);
        assert_eq!(parse_choice("replace\n"), ConflictPolicy::Replace);
    }

    #[test]
    fn unrecognized_input_keeps() {
        assert_eq!(parse_choice(""), ConflictPolicy::Keep);
        assert_eq!(parse_choice("yes"), ConflictPolicy::Keep);
        assert_eq!(parse_choice("x"), ConflictPolicy::Keep);
    }

    #[test]
    fn flags_map_to_policy() {
        assert_eq!(ConflictPolicy::from_flags(false, false).unwrap(), None);
        assert_eq!(
            ConflictPolicy::from_flags(true, false).unwrap(),
            Some(ConflictPolicy::Replace)
        );
        assert_eq!(
            ConflictPolicy::from_flags(false, true).unwrap(),
            Some(ConflictPolicy::Backup)
        );
        assert!(matches!(
            ConflictPolicy::from_flags(true, true),
            Err(JkbError::Usage(_))
        ));
    }

    #[test]
    fn prompt_reads_one_line() {
        let mut prompt = Prompt::new(&b"b\nr\n"[..], Vec::new());
        let target = PathBuf::from("/usr/src/kernel");
        assert_eq!(prompt.resolve(&target).unwrap(), ConflictPolicy::Backup);
        let shown = String::from_utf8(prompt.into_output()).unwrap();
        assert!(shown.contains("/usr/src/kernel"));
        assert!(shown.contains("[k]eep, [r]eplace or [b]ackup?"));
    }

    #[test]
    fn prompt_eof_keeps() {
        let mut prompt = Prompt::new(&b""[..], Vec::new());
        assert_eq!(
            prompt.resolve(Path::new("/usr/src/kernel")).unwrap(),
            ConflictPolicy::Keep
        );
    }

    #[test]
    fn fixed_policy_resolves_to_itself() {
        let mut p = ConflictPolicy::Replace;
        assert_eq!(p.resolve(Path::new("/x")).unwrap(), ConflictPolicy::Replace);
    }
}
