//! Real subprocess execution via tokio

use super::{CommandOutput, CommandRunner, CommandSpec};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

#[derive(Debug, Default, Clone)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec, timeout: Option<Duration>) -> Result<CommandOutput> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &spec.cwd {
            cmd.current_dir(cwd);
        }

        debug!(command = %spec.rendered(), cwd = ?spec.cwd, "Running command");

        let future = cmd.output();
        let output = match timeout {
            Some(limit) => match tokio::time::timeout(limit, future).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(
                        command = %spec.rendered(),
                        timeout_secs = limit.as_secs(),
                        "Command timed out"
                    );
                    return Ok(CommandOutput::timed_out());
                }
            },
            None => future.await,
        };

        let output = output.with_context(|| format!("failed to spawn '{}'", spec.rendered()))?;

        Ok(CommandOutput {
            success: output.status.success(),
            timed_out: false,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}
