//! Package-manager provisioning
//!
//! Ensures every required manager binary is present and functional before
//! any dependency install runs. Distinct managers are provisioned
//! concurrently under a fixed worker cap; exhausting a manager's install
//! commands is fatal because nothing downstream can succeed without it.

use crate::error::BootstrapError;
use crate::exec::{CommandRunner, CommandSpec};
use crate::fingerprint::provisioning_commands;
use crate::stack::{HostOs, ManagerId};
use anyhow::Result;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Install commands are I/O- and network-bound; this caps the fan-out.
pub const MAX_PARALLEL_PROVISIONS: usize = 8;

pub struct Provisioner<R: CommandRunner> {
    runner: Arc<R>,
    os: HostOs,
    version_cache: Arc<Mutex<HashMap<ManagerId, String>>>,
}

impl<R: CommandRunner + 'static> Provisioner<R> {
    pub fn new(runner: Arc<R>, os: HostOs) -> Self {
        Self {
            runner,
            os,
            version_cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Provision every manager in the set, fanning out across a bounded
    /// worker pool and blocking until all jobs finish. The first fatal
    /// provisioning failure is returned.
    pub async fn provision_all(&self, managers: &BTreeSet<ManagerId>) -> Result<()> {
        if managers.is_empty() {
            return Ok(());
        }

        info!(
            count = managers.len(),
            "Provisioning required package managers in parallel"
        );

        let semaphore = Arc::new(Semaphore::new(MAX_PARALLEL_PROVISIONS));
        let mut jobs = JoinSet::new();

        for manager in managers.iter().copied() {
            let runner = self.runner.clone();
            let cache = self.version_cache.clone();
            let semaphore = semaphore.clone();
            let os = self.os;
            jobs.spawn(async move {
                let _permit = semaphore.acquire_owned().await.expect("semaphore open");
                ensure_manager(runner.as_ref(), cache, os, manager).await
            });
        }

        let mut first_error = None;
        while let Some(joined) = jobs.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(anyhow::anyhow!("provisioning task panicked: {e}"));
                    }
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                info!("All required package managers are installed");
                Ok(())
            }
        }
    }

    /// Provision a single manager (probe, then run installers until one
    /// leaves a functional binary behind).
    pub async fn ensure(&self, manager: ManagerId) -> Result<()> {
        ensure_manager(
            self.runner.as_ref(),
            self.version_cache.clone(),
            self.os,
            manager,
        )
        .await
    }

    /// Version output captured during probing, if the manager was functional.
    pub fn cached_version(&self, manager: ManagerId) -> Option<String> {
        self.version_cache.lock().unwrap().get(&manager).cloned()
    }
}

async fn ensure_manager<R: CommandRunner + ?Sized>(
    runner: &R,
    cache: Arc<Mutex<HashMap<ManagerId, String>>>,
    os: HostOs,
    manager: ManagerId,
) -> Result<()> {
    info!(manager = %manager, "Checking if package manager is installed");

    if cache.lock().unwrap().contains_key(&manager) {
        return Ok(());
    }

    if let Some(version) = probe(runner, manager).await {
        info!(manager = %manager, version = %version.trim(), "Already installed and working");
        cache.lock().unwrap().insert(manager, version);
        return Ok(());
    }

    info!(manager = %manager, "Not found or not working, initiating installation");

    let Some(commands) = provisioning_commands(manager, os) else {
        warn!(manager = %manager, os = %os, "No install commands for this OS, skipping");
        return Ok(());
    };

    for argv in commands {
        let spec = CommandSpec::new(argv);
        info!(manager = %manager, command = %spec.rendered(), "Running install command");

        match runner.run(&spec, None).await {
            Ok(out) if out.success => {}
            Ok(out) => {
                warn!(
                    manager = %manager,
                    command = %spec.rendered(),
                    stderr = %out.stderr.trim(),
                    "Install command failed"
                );
                continue;
            }
            Err(e) => {
                warn!(manager = %manager, command = %spec.rendered(), error = %e, "Install command could not run");
                continue;
            }
        }

        if let Some(version) = probe(runner, manager).await {
            info!(
                manager = %manager,
                command = %spec.rendered(),
                "Installed successfully"
            );
            cache.lock().unwrap().insert(manager, version);
            return Ok(());
        }
    }

    Err(BootstrapError::ProvisioningFailed {
        manager: manager.as_str().to_string(),
    }
    .into())
}

/// A manager counts as present only when its binary both resolves and
/// reports a version successfully.
async fn probe<R: CommandRunner + ?Sized>(runner: &R, manager: ManagerId) -> Option<String> {
    let mut argv = vec![manager.binary()];
    argv.extend_from_slice(manager.version_args());
    let spec = CommandSpec::new(&argv);

    match runner.run(&spec, None).await {
        Ok(out) if out.success => Some(out.stdout),
        Ok(_) => {
            warn!(manager = %manager, "Found on PATH but not working properly");
            None
        }
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::MockRunner;

    fn provisioner(runner: MockRunner) -> (Arc<MockRunner>, Provisioner<MockRunner>) {
        let runner = Arc::new(runner);
        (runner.clone(), Provisioner::new(runner, HostOs::Linux))
    }

    #[tokio::test]
    async fn test_functional_manager_is_noop() {
        let runner = MockRunner::new();
        runner.respond_with("yarn --version", "1.22.19");
        let (runner, provisioner) = provisioner(runner);

        provisioner.ensure(ManagerId::Yarn).await.unwrap();

        assert_eq!(runner.calls().len(), 1);
        assert_eq!(
            provisioner.cached_version(ManagerId::Yarn).unwrap(),
            "1.22.19"
        );
    }

    #[tokio::test]
    async fn test_install_that_leaves_no_binary_is_fatal() {
        let runner = MockRunner::new();
        // The binary never appears, even though the install command itself
        // exits zero; the re-probe must catch that.
        runner.missing_program("pipenv");
        let (runner, provisioner) = provisioner(runner);

        let err = provisioner.ensure(ManagerId::Pipenv).await.unwrap_err();
        let err = err.downcast::<BootstrapError>().unwrap();
        assert!(matches!(err, BootstrapError::ProvisioningFailed { .. }));

        // probe, pip install pipenv, re-probe
        assert_eq!(runner.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_broken_manager_triggers_reinstall() {
        let runner = MockRunner::new();
        runner.fail_times("pipenv --version", 1);
        let (runner, provisioner) = provisioner(runner);

        provisioner.ensure(ManagerId::Pipenv).await.unwrap();

        // probe (fail), pip install pipenv, re-probe (success)
        let calls = runner.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[1].rendered(), "pip install pipenv");
    }

    #[tokio::test]
    async fn test_exhausted_installers_are_fatal() {
        let runner = MockRunner::new();
        runner.fail_when("mvn --version");
        runner.fail_when("sudo apt-get install -y maven");
        let (_, provisioner) = provisioner(runner);

        let err = provisioner.ensure(ManagerId::Maven).await.unwrap_err();
        let err = err.downcast::<BootstrapError>().unwrap();
        assert!(matches!(err, BootstrapError::ProvisioningFailed { ref manager } if manager == "mvn"));
    }

    #[tokio::test]
    async fn test_manager_without_os_route_is_skipped() {
        let runner = MockRunner::new();
        runner.fail_when("move --version");
        let (_, provisioner) = provisioner(runner);

        // No provisioning route for Move: skipped with a warning, not fatal.
        provisioner.ensure(ManagerId::Move).await.unwrap();
    }

    #[tokio::test]
    async fn test_provision_all_runs_every_manager() {
        let runner = MockRunner::new();
        let (runner, provisioner) = provisioner(runner);

        let managers: BTreeSet<_> =
            [ManagerId::Npm, ManagerId::Pip, ManagerId::Cargo].into_iter().collect();
        provisioner.provision_all(&managers).await.unwrap();

        // All functional: one probe each, no installs.
        assert_eq!(runner.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_provision_all_surfaces_fatal_failure() {
        let runner = MockRunner::new();
        runner.fail_when("gradle --version");
        runner.fail_when("apt-get install -y gradle");
        let (_, provisioner) = provisioner(runner);

        let managers: BTreeSet<_> = [ManagerId::Npm, ManagerId::Gradle].into_iter().collect();
        let result = provisioner.provision_all(&managers).await;
        assert!(result.is_err());
    }
}
