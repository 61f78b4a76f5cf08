//! Scriptable command runner for tests
//!
//! Records every invocation in order and answers according to the first
//! matching rule, so tests can assert exact attempt counts, working
//! directories, and phase ordering without running real installers.

use super::{CommandOutput, CommandRunner, CommandSpec};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug)]
enum Response {
    FailAlways,
    FailTimes(usize),
    TimeoutAlways,
    Stdout(String),
}

#[derive(Debug)]
struct Rule {
    needle: String,
    response: Response,
}

#[derive(Debug, Default)]
struct Inner {
    calls: Vec<CommandSpec>,
    rules: Vec<Rule>,
    missing_programs: Vec<String>,
}

#[derive(Debug, Default)]
pub struct MockRunner {
    inner: Mutex<Inner>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Any command whose rendered form contains `needle` fails every time.
    pub fn fail_when(&self, needle: &str) {
        self.push_rule(needle, Response::FailAlways);
    }

    /// Fails the first `times` matching invocations, then succeeds.
    pub fn fail_times(&self, needle: &str, times: usize) {
        self.push_rule(needle, Response::FailTimes(times));
    }

    /// Matching commands report a wall-clock timeout.
    pub fn timeout_when(&self, needle: &str) {
        self.push_rule(needle, Response::TimeoutAlways);
    }

    /// Matching commands succeed with the given stdout.
    pub fn respond_with(&self, needle: &str, stdout: &str) {
        self.push_rule(needle, Response::Stdout(stdout.to_string()));
    }

    /// Invoking this program fails to spawn, as if it were not on PATH.
    pub fn missing_program(&self, program: &str) {
        self.inner
            .lock()
            .unwrap()
            .missing_programs
            .push(program.to_string());
    }

    /// Stop treating a program as missing (simulates a successful install).
    pub fn restore_program(&self, program: &str) {
        self.inner
            .lock()
            .unwrap()
            .missing_programs
            .retain(|p| p != program);
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn calls_matching(&self, needle: &str) -> Vec<CommandSpec> {
        self.calls()
            .into_iter()
            .filter(|c| c.rendered().contains(needle))
            .collect()
    }

    fn push_rule(&self, needle: &str, response: Response) {
        self.inner.lock().unwrap().rules.push(Rule {
            needle: needle.to_string(),
            response,
        });
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(&self, spec: &CommandSpec, _timeout: Option<Duration>) -> Result<CommandOutput> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(spec.clone());

        if inner.missing_programs.iter().any(|p| *p == spec.program) {
            return Err(anyhow!("command not found: {}", spec.program));
        }

        let rendered = spec.rendered();
        for rule in inner.rules.iter_mut() {
            if !rendered.contains(&rule.needle) {
                continue;
            }
            return Ok(match &mut rule.response {
                Response::FailAlways => CommandOutput::failed("scripted failure"),
                Response::FailTimes(remaining) => {
                    if *remaining > 0 {
                        *remaining -= 1;
                        CommandOutput::failed("scripted failure")
                    } else {
                        CommandOutput::succeeded("")
                    }
                }
                Response::TimeoutAlways => CommandOutput::timed_out(),
                Response::Stdout(out) => CommandOutput::succeeded(out.clone()),
            });
        }

        Ok(CommandOutput::succeeded(""))
    }
}
