//! External command execution
//!
//! Every subprocess the bootstrap runs goes through the [`CommandRunner`]
//! seam. Production uses [`SystemRunner`] (tokio process with an optional
//! wall-clock timeout); tests use [`MockRunner`], which records every
//! invocation and can script failures, timeouts, and missing binaries.

use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod mock;
pub mod retry;
pub mod system;

pub use mock::MockRunner;
pub use retry::{backoff_delays, run_candidates_with_retry, run_with_retry, RetryPolicy};
pub use system::SystemRunner;

/// A fully constructed argument vector plus optional working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    /// Build from an argv slice; the first element is the program.
    pub fn new(argv: &[&str]) -> Self {
        assert!(!argv.is_empty(), "empty argv");
        Self {
            program: argv[0].to_string(),
            args: argv[1..].iter().map(|s| s.to_string()).collect(),
            cwd: None,
        }
    }

    pub fn in_dir(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    /// One-line rendering for logs.
    pub fn rendered(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Outcome of a command that could at least be spawned.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub success: bool,
    pub timed_out: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn succeeded(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            timed_out: false,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            timed_out: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn timed_out() -> Self {
        Self {
            success: false,
            timed_out: true,
            stdout: String::new(),
            stderr: String::new(),
        }
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion.
    ///
    /// `Err` means the command could not be spawned at all (typically the
    /// binary is not on PATH); `Ok` carries exit-status and timeout
    /// information. A timeout is reported as a failed run, not an error.
    async fn run(&self, spec: &CommandSpec, timeout: Option<Duration>) -> Result<CommandOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_spec_from_argv() {
        let spec = CommandSpec::new(&["npm", "install", "--no-optional"]);
        assert_eq!(spec.program, "npm");
        assert_eq!(spec.args, vec!["install", "--no-optional"]);
        assert_eq!(spec.rendered(), "npm install --no-optional");
    }

    #[test]
    fn test_command_spec_in_dir() {
        let spec = CommandSpec::new(&["go", "mod", "download"]).in_dir(Path::new("/tmp/repo"));
        assert_eq!(spec.cwd.as_deref(), Some(Path::new("/tmp/repo")));
    }
}
