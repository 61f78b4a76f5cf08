//! Bootstrap phase driver
//!
//! Runs the sequential phases over a cloned checkout: fingerprint →
//! provision → resolve/switch versions → install dependencies → scan for
//! environment variables. A runtime version switch restarts the loop from
//! fingerprinting, with [`ResumeState`] preventing the switch from being
//! re-applied on the next pass.

use crate::envscan;
use crate::exec::{CommandRunner, RetryPolicy};
use crate::fingerprint;
use crate::git;
use crate::installer::DependencyInstaller;
use crate::provision::Provisioner;
use crate::stack::{HostOs, ToolId};
use crate::versions::{self, SwitchOutcome, VersionSwitcher};
use anyhow::{bail, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

pub mod resume;

pub use resume::ResumeState;

/// Version switches restart the loop; anything beyond this many restarts in
/// one run means the switch is not sticking.
const MAX_RESTARTS: u32 = 3;

/// What the bootstrap produced: where the checkout lives and which
/// environment variables it needs. Prompting for missing values is the
/// caller's concern.
#[derive(Debug)]
pub struct BootstrapReport {
    pub repo_path: PathBuf,
    pub env_vars: BTreeSet<String>,
}

enum PassOutcome {
    Complete(BTreeSet<String>),
    Restart,
}

pub struct Bootstrap<R: CommandRunner + 'static> {
    runner: Arc<R>,
    os: HostOs,
    dest_root: PathBuf,
    policy: RetryPolicy,
}

impl<R: CommandRunner + 'static> Bootstrap<R> {
    pub fn new(runner: Arc<R>, os: HostOs, dest_root: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            os,
            dest_root: dest_root.into(),
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub async fn run(&self, repo_url: &str) -> Result<BootstrapReport> {
        std::fs::create_dir_all(&self.dest_root)?;
        let repo_name = git::repo_name_from_url(repo_url);
        let repo_path = self.dest_root.join(&repo_name);

        git::clone_repository(self.runner.as_ref(), repo_url, &repo_path, &self.policy).await?;

        let mut resume = ResumeState::load(&repo_path).unwrap_or_default();
        if let Some(version) = resume::consume_legacy_marker(&repo_path) {
            resume.node_target.get_or_insert(version);
        }

        let mut restarts = 0;
        loop {
            match self.run_phases(&repo_path, &mut resume).await? {
                PassOutcome::Complete(env_vars) => {
                    ResumeState::clear(&repo_path);
                    info!(repo = %repo_path.display(), "Bootstrap complete");
                    return Ok(BootstrapReport {
                        repo_path,
                        env_vars,
                    });
                }
                PassOutcome::Restart => {
                    restarts += 1;
                    if restarts > MAX_RESTARTS {
                        bail!(
                            "runtime version switch did not converge after {MAX_RESTARTS} restarts"
                        );
                    }
                    info!(restarts, "Restarting bootstrap phases after runtime switch");
                }
            }
        }
    }

    async fn run_phases(
        &self,
        repo_path: &Path,
        resume: &mut ResumeState,
    ) -> Result<PassOutcome> {
        let managers = fingerprint::required_managers(repo_path);
        info!(
            managers = ?managers.iter().map(|m| m.as_str()).collect::<Vec<_>>(),
            "Fingerprinted repository"
        );

        let provisioner = Provisioner::new(self.runner.clone(), self.os);
        provisioner.provision_all(&managers).await?;

        let required = versions::resolve(repo_path);
        let switcher = VersionSwitcher::new(self.runner.clone());
        for (tool, constraint) in versions::in_apply_order(&required) {
            if tool == ToolId::Node {
                if let Some(target) = &resume.node_target {
                    debug!(target = %target, "Node switch already applied, skipping");
                    continue;
                }
            }
            match switcher.apply(tool, &constraint).await? {
                SwitchOutcome::Applied => {}
                SwitchOutcome::RestartRequired { version } => {
                    resume.node_target = Some(version);
                    resume.save(repo_path)?;
                    return Ok(PassOutcome::Restart);
                }
            }
        }

        let installer =
            DependencyInstaller::new(self.runner.clone()).with_policy(self.policy.clone());
        installer.install_all(repo_path).await?;

        let env_vars = envscan::scan(repo_path);
        Ok(PassOutcome::Complete(env_vars))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::MockRunner;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn bootstrap(runner: &Arc<MockRunner>, dest: &Path) -> Bootstrap<MockRunner> {
        Bootstrap::new(Arc::clone(runner), HostOs::Linux, dest).with_policy(RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            attempt_timeout: None,
        })
    }

    /// An existing checkout: the clone phase is skipped entirely.
    fn seeded_checkout(dest: &Path, name: &str) -> PathBuf {
        let repo = dest.join(name);
        fs::create_dir_all(&repo).unwrap();
        repo
    }

    #[tokio::test]
    async fn test_python_repo_end_to_end() {
        let dir = TempDir::new().unwrap();
        let repo = seeded_checkout(dir.path(), "widget");
        fs::write(repo.join("requirements.txt"), "requests\n").unwrap();
        fs::write(repo.join("app.py"), "import os\nos.getenv('WIDGET_TOKEN')\n").unwrap();

        let runner = Arc::new(MockRunner::new());
        runner.respond_with("pip --version", "pip 23.0");
        let report = bootstrap(&runner, dir.path())
            .run("https://github.com/acme/widget.git")
            .await
            .unwrap();

        assert_eq!(report.repo_path, repo);
        assert!(report.env_vars.contains("WIDGET_TOKEN"));
        assert_eq!(runner.calls_matching("git clone").len(), 0);
        assert_eq!(
            runner
                .calls_matching("pip install --no-cache-dir --ignore-installed --no-deps -r requirements.txt")
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_node_switch_restarts_phases_once() {
        let dir = TempDir::new().unwrap();
        let repo = seeded_checkout(dir.path(), "dapp");
        fs::write(
            repo.join("package.json"),
            r#"{"name": "dapp", "engines": {"node": ">=14.0.0"}}"#,
        )
        .unwrap();

        let runner = Arc::new(MockRunner::new());
        // `node -v` yields nothing useful, so the constraint is unverifiable
        // and nvm gets invoked.
        let report = bootstrap(&runner, dir.path())
            .run("https://github.com/acme/dapp.git")
            .await
            .unwrap();

        // Exactly one nvm switch despite two phase passes.
        assert_eq!(runner.calls_matching("nvm install").len(), 1);
        // The install phase ran on the second pass.
        assert!(!runner
            .calls_matching("npm install --legacy-peer-deps")
            .is_empty());
        // Resume state is cleared on completion.
        assert_eq!(ResumeState::load(&report.repo_path), None);
    }

    #[tokio::test]
    async fn test_satisfied_node_constraint_needs_no_restart() {
        let dir = TempDir::new().unwrap();
        let repo = seeded_checkout(dir.path(), "site");
        fs::write(
            repo.join("package.json"),
            r#"{"name": "site", "engines": {"node": ">=14.0.0"}}"#,
        )
        .unwrap();

        let runner = Arc::new(MockRunner::new());
        runner.respond_with("node -v", "v18.19.0\n");
        bootstrap(&runner, dir.path())
            .run("https://github.com/acme/site.git")
            .await
            .unwrap();

        assert!(runner.calls_matching("nvm install").is_empty());
    }

    #[tokio::test]
    async fn test_legacy_marker_prevents_second_switch() {
        let dir = TempDir::new().unwrap();
        let repo = seeded_checkout(dir.path(), "legacy");
        fs::write(
            repo.join("package.json"),
            r#"{"name": "legacy", "engines": {"node": ">=14.0.0"}}"#,
        )
        .unwrap();
        fs::write(repo.join(".node_version_change"), "14.0.0\n").unwrap();

        let runner = Arc::new(MockRunner::new());
        bootstrap(&runner, dir.path())
            .run("https://github.com/acme/legacy.git")
            .await
            .unwrap();

        assert!(runner.calls_matching("nvm install").is_empty());
        assert!(!repo.join(".node_version_change").exists());
    }

    #[tokio::test]
    async fn test_provisioning_failure_aborts_run() {
        let dir = TempDir::new().unwrap();
        let repo = seeded_checkout(dir.path(), "gems");
        fs::write(repo.join("Gemfile"), "source 'https://rubygems.org'\n").unwrap();

        let runner = Arc::new(MockRunner::new());
        runner.missing_program("bundle");
        runner.fail_when("gem install bundler");

        let err = bootstrap(&runner, dir.path())
            .run("https://github.com/acme/gems.git")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("bundle"));
        // Nothing downstream of provisioning ran.
        assert!(runner.calls_matching("bundle install").is_empty());
    }
}
