//! Exponential-backoff retry around external commands
//!
//! Matches the original bootstrap behavior: a fixed attempt cap, a base delay
//! that doubles between attempts, and a wall-clock limit per attempt. A
//! timeout counts as a failed attempt. Within one attempt, candidate commands
//! are tried in priority order and the first success short-circuits.

use super::{CommandOutput, CommandRunner, CommandSpec};
use anyhow::{anyhow, Result};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub attempt_timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(5),
            attempt_timeout: Some(Duration::from_secs(300)),
        }
    }
}

/// The delays slept between attempts: `base, 2*base, 4*base, ...`
/// (one fewer than `max_attempts`).
pub fn backoff_delays(policy: &RetryPolicy) -> Vec<Duration> {
    (0..policy.max_attempts.saturating_sub(1))
        .map(|i| policy.base_delay * 2u32.pow(i))
        .collect()
}

pub async fn run_with_retry(
    runner: &dyn CommandRunner,
    spec: &CommandSpec,
    policy: &RetryPolicy,
) -> Result<CommandOutput> {
    run_candidates_with_retry(runner, std::slice::from_ref(spec), policy).await
}

/// Retry a priority-ordered candidate list.
///
/// Each attempt walks the candidates in order and returns on the first
/// success; only when every candidate fails does the attempt count against
/// the cap. `Err` after exhaustion carries the attempt count; the caller
/// decides whether that is fatal.
pub async fn run_candidates_with_retry(
    runner: &dyn CommandRunner,
    candidates: &[CommandSpec],
    policy: &RetryPolicy,
) -> Result<CommandOutput> {
    assert!(!candidates.is_empty(), "no candidate commands");
    let delays = backoff_delays(policy);

    for attempt in 1..=policy.max_attempts {
        for spec in candidates {
            match runner.run(spec, policy.attempt_timeout).await {
                Ok(output) if output.success => {
                    debug!(command = %spec.rendered(), attempt, "Command succeeded");
                    return Ok(output);
                }
                Ok(output) if output.timed_out => {
                    warn!(command = %spec.rendered(), attempt, "Command timed out");
                }
                Ok(output) => {
                    warn!(
                        command = %spec.rendered(),
                        attempt,
                        stderr = %output.stderr.trim(),
                        "Command failed"
                    );
                }
                Err(e) => {
                    warn!(command = %spec.rendered(), attempt, error = %e, "Command could not run");
                }
            }
        }

        if let Some(delay) = delays.get(attempt as usize - 1) {
            debug!(attempt, delay_secs = delay.as_secs(), "Retrying after backoff");
            tokio::time::sleep(*delay).await;
        }
    }

    Err(anyhow!(
        "'{}' failed after {} attempts",
        candidates[0].rendered(),
        policy.max_attempts
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::MockRunner;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_secs(5),
            attempt_timeout: None,
        }
    }

    #[test]
    fn test_backoff_delays_double() {
        let delays = backoff_delays(&RetryPolicy::default());
        assert_eq!(
            delays,
            vec![Duration::from_secs(5), Duration::from_secs(10)]
        );
        for pair in delays.windows(2) {
            assert!(pair[1] > pair[0]);
            assert_eq!(pair[1], pair[0] * 2);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_failing_command_attempts_exactly_cap() {
        let runner = MockRunner::new();
        runner.fail_when("npm install");

        let spec = CommandSpec::new(&["npm", "install"]);
        let result = run_with_retry(&runner, &spec, &fast_policy()).await;

        assert!(result.is_err());
        assert_eq!(runner.calls().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_as_failed_attempt() {
        let runner = MockRunner::new();
        runner.timeout_when("gradle build");

        let spec = CommandSpec::new(&["gradle", "build", "-x", "test"]);
        let result = run_with_retry(&runner, &spec, &fast_policy()).await;

        assert!(result.is_err());
        assert_eq!(runner.calls().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failure() {
        let runner = MockRunner::new();
        runner.fail_times("pip install", 1);

        let spec = CommandSpec::new(&["pip", "install", "-r", "requirements.txt"]);
        let output = run_with_retry(&runner, &spec, &fast_policy()).await.unwrap();

        assert!(output.success);
        assert_eq!(runner.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_candidates_short_circuit_on_first_success() {
        let runner = MockRunner::new();
        // Fails the bare-pip and python -m pip candidates (both contain this
        // rendering), leaving pip3 to succeed.
        runner.fail_when("pip install --no-cache-dir --ignore-installed --no-deps -r requirements.txt");

        let candidates = vec![
            CommandSpec::new(&["pip", "install", "--no-cache-dir", "--ignore-installed", "--no-deps", "-r", "requirements.txt"]),
            CommandSpec::new(&[
                "python", "-m", "pip", "install", "--no-cache-dir", "--ignore-installed", "--no-deps", "-r", "requirements.txt",
            ]),
            CommandSpec::new(&["pip3", "install", "--no-cache-dir", "--ignore-installed", "--no-deps", "-r", "requirements.txt"]),
        ];
        let output = run_candidates_with_retry(&runner, &candidates, &fast_policy())
            .await
            .unwrap();

        assert!(output.success);
        // First two candidates failed, third succeeded within the first
        // attempt; no retries were consumed.
        assert_eq!(runner.calls().len(), 3);
        assert_eq!(runner.calls()[2].program, "pip3");
    }
}
