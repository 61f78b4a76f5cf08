//! Repository cloning
//!
//! Shallow single-branch clones with the same bounded retry/backoff policy
//! as the installers. A handful of git HTTP configs are applied best-effort
//! first; an existing checkout short-circuits the clone entirely.

use crate::error::BootstrapError;
use crate::exec::{run_with_retry, CommandRunner, CommandSpec, RetryPolicy};
use anyhow::Result;
use std::path::Path;
use tracing::{debug, info, warn};

/// Global git configs that make large clones over flaky HTTP survivable.
/// Failures here are warnings; the clone still gets attempted.
const GIT_HTTP_CONFIGS: &[&[&str]] = &[
    &["git", "config", "--global", "http.postBuffer", "1048576000"],
    &["git", "config", "--global", "http.maxRequestBuffer", "100M"],
    &["git", "config", "--global", "core.compression", "0"],
    &["git", "config", "--global", "http.lowSpeedLimit", "1000"],
    &["git", "config", "--global", "http.lowSpeedTime", "60"],
];

/// Derive the checkout directory name from a repository URL: the last path
/// segment with any `.git` suffix removed.
pub fn repo_name_from_url(repo_url: &str) -> String {
    let trimmed = repo_url.trim_end_matches('/');
    let last = trimmed.rsplit('/').next().unwrap_or(trimmed);
    last.strip_suffix(".git").unwrap_or(last).to_string()
}

/// Clone `repo_url` into `dest`. An existing destination is treated as an
/// already-completed clone. Exhausting the retry budget is fatal.
pub async fn clone_repository<R: CommandRunner>(
    runner: &R,
    repo_url: &str,
    dest: &Path,
    policy: &RetryPolicy,
) -> Result<()> {
    if dest.exists() {
        info!(dest = %dest.display(), "Checkout already exists, skipping clone");
        return Ok(());
    }

    for config in GIT_HTTP_CONFIGS {
        let spec = CommandSpec::new(config);
        match runner.run(&spec, None).await {
            Ok(out) if out.success => debug!(config = %spec.rendered(), "Applied git config"),
            Ok(out) => warn!(
                config = %spec.rendered(),
                stderr = %out.stderr.trim(),
                "Failed to apply git config"
            ),
            Err(e) => warn!(config = %spec.rendered(), error = %e, "Failed to apply git config"),
        }
    }

    let dest_str = dest.to_string_lossy();
    let spec = CommandSpec::new(&[
        "git",
        "clone",
        "--depth",
        "1",
        "--single-branch",
        "--no-tags",
        repo_url,
        dest_str.as_ref(),
    ]);

    info!(url = %repo_url, dest = %dest.display(), "Cloning repository");
    run_with_retry(runner, &spec, policy)
        .await
        .map_err(|_| BootstrapError::CloneFailed {
            url: repo_url.to_string(),
        })?;
    info!(dest = %dest.display(), "Repository cloned");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::MockRunner;
    use std::time::Duration;
    use tempfile::TempDir;
    use yare::parameterized;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            attempt_timeout: None,
        }
    }

    #[parameterized(
        https = { "https://github.com/acme/widget.git", "widget" },
        no_suffix = { "https://github.com/acme/widget", "widget" },
        trailing_slash = { "https://github.com/acme/widget/", "widget" },
        ssh = { "git@github.com:acme/widget.git", "widget" },
    )]
    fn test_repo_name_from_url(url: &str, expected: &str) {
        assert_eq!(repo_name_from_url(url), expected);
    }

    #[tokio::test]
    async fn test_existing_checkout_skips_clone() {
        let dir = TempDir::new().unwrap();
        let runner = MockRunner::new();

        clone_repository(
            &runner,
            "https://github.com/acme/widget.git",
            dir.path(),
            &fast_policy(),
        )
        .await
        .unwrap();

        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_clone_applies_configs_then_clones() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("widget");
        let runner = MockRunner::new();

        clone_repository(
            &runner,
            "https://github.com/acme/widget.git",
            &dest,
            &fast_policy(),
        )
        .await
        .unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), GIT_HTTP_CONFIGS.len() + 1);
        let clone = calls.last().unwrap();
        assert!(clone.rendered().starts_with("git clone --depth 1"));
        assert!(clone.args.contains(&"--single-branch".to_string()));
    }

    #[tokio::test]
    async fn test_failed_configs_do_not_block_clone() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("widget");
        let runner = MockRunner::new();
        runner.fail_when("git config");

        clone_repository(
            &runner,
            "https://github.com/acme/widget.git",
            &dest,
            &fast_policy(),
        )
        .await
        .unwrap();

        assert_eq!(runner.calls_matching("git clone").len(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_clone_is_fatal() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("widget");
        let runner = MockRunner::new();
        runner.fail_when("git clone");

        let err = clone_repository(
            &runner,
            "https://github.com/acme/widget.git",
            &dest,
            &fast_policy(),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<BootstrapError>(),
            Some(BootstrapError::CloneFailed { .. })
        ));
        assert_eq!(runner.calls_matching("git clone").len(), 3);
    }
}
