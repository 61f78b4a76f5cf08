//! Version switching
//!
//! Package managers are switched in place through npm's global install; the
//! node runtime itself goes through nvm and requires restarting the phase
//! loop so everything downstream runs under the new runtime.

use crate::error::BootstrapError;
use crate::exec::{CommandRunner, CommandSpec};
use crate::stack::ToolId;
use anyhow::Result;
use semver::Version;
use std::sync::Arc;
use tracing::{info, warn};

/// Active node version → compatible concrete npm version. Ordered prefix
/// match against `node -v` output.
const NPM_COMPAT: &[(&str, &str)] = &[
    ("20.0", "9.6.4"),
    ("20.5", "10.9.2"),
    ("18.17", "10.9.2"),
    ("18", "9.6.4"),
    ("16", "8.19.4"),
    ("14", "6.14.18"),
];
const NPM_FALLBACK: &str = "9.6.4";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// Constraint already satisfied or tool switched in place.
    Applied,
    /// The runtime changed; the phase loop must restart from the top.
    RestartRequired { version: String },
}

pub struct VersionSwitcher<R: CommandRunner> {
    runner: Arc<R>,
}

impl<R: CommandRunner> VersionSwitcher<R> {
    pub fn new(runner: Arc<R>) -> Self {
        Self { runner }
    }

    pub async fn apply(&self, tool: ToolId, constraint: &str) -> Result<SwitchOutcome> {
        info!(tool = %tool.as_str(), constraint, "Applying version constraint");
        match tool {
            ToolId::Node => self.apply_node(constraint).await,
            ToolId::Npm => self.apply_npm(constraint).await,
            ToolId::Yarn => self.apply_manager("yarn", constraint).await,
        }
    }

    async fn apply_node(&self, constraint: &str) -> Result<SwitchOutcome> {
        if let Some(floor) = constraint.strip_prefix(">=") {
            if let (Some(current), Some(required)) =
                (self.active_node_version().await, parse_loose(floor))
            {
                if current >= required {
                    info!(%current, constraint, "Active node version satisfies requirement");
                    return Ok(SwitchOutcome::Applied);
                }
            }
        }

        let target = nvm_target(constraint);
        let nvm_dir = dirs::home_dir()
            .map(|h| h.join(".nvm"))
            .unwrap_or_else(|| "/root/.nvm".into());
        let script = format!(
            "export NVM_DIR=\"{}\"\n\
             [ -s \"$NVM_DIR/nvm.sh\" ] && . \"$NVM_DIR/nvm.sh\"\n\
             nvm install {target}\n\
             nvm use {target}",
            nvm_dir.display()
        );

        let spec = CommandSpec::new(&["bash", "-c", &script]);
        let switched = match self.runner.run(&spec, None).await {
            Ok(out) => out.success,
            Err(e) => {
                warn!(error = %e, "Could not invoke nvm");
                false
            }
        };
        if !switched {
            return Err(BootstrapError::VersionSwitchFailed {
                tool: "node".to_string(),
                constraint: constraint.to_string(),
            }
            .into());
        }

        info!(target, "Node version changed, bootstrap phases must restart");
        Ok(SwitchOutcome::RestartRequired { version: target })
    }

    async fn apply_npm(&self, constraint: &str) -> Result<SwitchOutcome> {
        // npm is pinned to whatever the active node can actually run, not to
        // the raw constraint; mismatched npm/node pairs fail in confusing ways.
        let node_version = self
            .active_node_version_raw()
            .await
            .unwrap_or_default();
        let target = NPM_COMPAT
            .iter()
            .find(|(node_prefix, _)| node_version.starts_with(node_prefix))
            .map(|(_, npm)| *npm)
            .unwrap_or(NPM_FALLBACK);

        info!(
            npm_version = target,
            node_version, constraint, "Installing compatible npm version"
        );
        self.global_install("npm", target).await?;
        Ok(SwitchOutcome::Applied)
    }

    async fn apply_manager(&self, manager: &str, constraint: &str) -> Result<SwitchOutcome> {
        let version = constraint
            .trim_start_matches('^')
            .trim_start_matches('~');
        info!(manager, version, "Installing manager version");
        self.global_install(manager, version).await?;
        Ok(SwitchOutcome::Applied)
    }

    async fn global_install(&self, tool: &str, version: &str) -> Result<()> {
        let package = format!("{tool}@{version}");
        let spec = CommandSpec::new(&["npm", "install", "-g", &package]);
        let ok = match self.runner.run(&spec, None).await {
            Ok(out) => out.success,
            Err(e) => {
                warn!(error = %e, command = %spec.rendered(), "Global install could not run");
                false
            }
        };
        if ok {
            Ok(())
        } else {
            Err(BootstrapError::VersionSwitchFailed {
                tool: tool.to_string(),
                constraint: version.to_string(),
            }
            .into())
        }
    }

    async fn active_node_version(&self) -> Option<Version> {
        parse_loose(&self.active_node_version_raw().await?)
    }

    async fn active_node_version_raw(&self) -> Option<String> {
        let spec = CommandSpec::new(&["node", "-v"]);
        let out = self.runner.run(&spec, None).await.ok()?;
        if out.success {
            Some(out.stdout.trim().trim_start_matches('v').to_string())
        } else {
            None
        }
    }
}

/// Concrete version to hand to nvm when a range has to become one number:
/// the range's last bound with comparison/range prefixes stripped.
fn nvm_target(constraint: &str) -> String {
    let last = constraint
        .split_whitespace()
        .last()
        .unwrap_or(constraint);
    let mut target = last;
    for prefix in [">=", "<=", "^", "~", "=", "v"] {
        target = target.strip_prefix(prefix).unwrap_or(target);
    }
    target.to_string()
}

/// Parse `14`, `14.0`, or `14.0.0` as a semver version.
fn parse_loose(version: &str) -> Option<Version> {
    let trimmed = version.trim().trim_start_matches('v');
    let dots = trimmed.chars().filter(|c| *c == '.').count();
    let padded = match dots {
        0 => format!("{trimmed}.0.0"),
        1 => format!("{trimmed}.0"),
        _ => trimmed.to_string(),
    };
    Version::parse(&padded).ok()
}
