//! Dependency installation
//!
//! Walks the cloned repository top-down and runs the install command for
//! every manifest it recognizes, in the directory that holds the manifest.
//! Generated and vendored trees are excluded before recursion, nested git
//! checkouts are left alone, and a conventional `indexer/` npm workspace is
//! handled up front and pruned from the generic walk. Install failures are
//! logged and never abort the walk.

use crate::exec::{run_candidates_with_retry, CommandRunner, CommandSpec, RetryPolicy};
use crate::fingerprint::{specs_for, NODE_FILES};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub mod workspace;

/// Directory names never descended into: build output, vendored packages,
/// and virtualenvs.
pub const EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    "venv",
    "env",
    "__pycache__",
    ".terraform",
    "build",
    "dist",
    "target",
];

/// A directory with its own `.git` entry is a nested checkout (submodule or
/// embedded repository); its dependencies belong to that repository.
pub fn is_subrepository(dir: &Path) -> bool {
    let git = dir.join(".git");
    if git.is_dir() {
        return true;
    }
    // Submodules carry a `.git` file pointing at the parent's git dir.
    match std::fs::read_to_string(&git) {
        Ok(contents) => contents.contains("gitdir"),
        Err(_) => false,
    }
}

fn is_excluded(name: &str) -> bool {
    name.starts_with('.') || EXCLUDED_DIRS.contains(&name)
}

pub struct DependencyInstaller<R: CommandRunner> {
    runner: Arc<R>,
    policy: RetryPolicy,
}

impl<R: CommandRunner> DependencyInstaller<R> {
    pub fn new(runner: Arc<R>) -> Self {
        Self {
            runner,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Install dependencies for every recognized manifest under `root`.
    ///
    /// Parents are always handled before their children, and sibling
    /// directories in sorted-name order, so repeated runs issue commands in
    /// the same sequence.
    pub async fn install_all(&self, root: &Path) -> Result<()> {
        let workspace_root = root.join(workspace::WORKSPACE_DIR);
        let has_workspace = workspace_root.join("package.json").is_file();
        if has_workspace {
            workspace::install_workspace(self.runner.as_ref(), &workspace_root, &self.policy)
                .await?;
        }

        let mut stack: Vec<PathBuf> = vec![root.to_path_buf()];
        while let Some(dir) = stack.pop() {
            let entries = match std::fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "Cannot read directory, skipping");
                    continue;
                }
            };

            let mut files: Vec<String> = Vec::new();
            let mut subdirs: Vec<PathBuf> = Vec::new();
            for entry in entries.filter_map(|e| e.ok()) {
                let Ok(name) = entry.file_name().into_string() else {
                    continue;
                };
                let path = entry.path();
                if path.is_dir() {
                    if is_excluded(&name) {
                        debug!(dir = %path.display(), "Excluded from dependency walk");
                    } else if has_workspace && path == workspace_root {
                        debug!(dir = %path.display(), "Workspace already handled");
                    } else if is_subrepository(&path) {
                        info!(dir = %path.display(), "Skipping nested repository");
                    } else {
                        subdirs.push(path);
                    }
                } else {
                    files.push(name);
                }
            }

            // LIFO stack: push in reverse so children pop in sorted order.
            subdirs.sort();
            for sub in subdirs.into_iter().rev() {
                stack.push(sub);
            }
            files.sort();

            self.install_directory(&dir, &files).await;
        }

        Ok(())
    }

    async fn install_directory(&self, dir: &Path, files: &[String]) {
        // Any Node.js manifest gets one blanket npm install; per-lockfile
        // commands would double-install the same tree. A pnpm lockfile by
        // itself is not a trigger, only its package.json is.
        let node_triggers = ["package.json", "yarn.lock", "package-lock.json"];
        if files.iter().any(|f| node_triggers.contains(&f.as_str())) {
            self.install_node(dir).await;
        }

        for file in files {
            if NODE_FILES.contains(&file.as_str()) {
                continue;
            }
            for spec in specs_for(file) {
                let candidates: Vec<CommandSpec> = spec
                    .commands
                    .iter()
                    .map(|argv| CommandSpec::new(argv).in_dir(dir))
                    .collect();
                info!(
                    manifest = %file,
                    manager = %spec.manager,
                    dir = %dir.display(),
                    "Installing dependencies"
                );
                if let Err(e) =
                    run_candidates_with_retry(self.runner.as_ref(), &candidates, &self.policy)
                        .await
                {
                    error!(
                        manifest = %file,
                        dir = %dir.display(),
                        error = %e,
                        "Dependency installation failed"
                    );
                }
            }
        }
    }

    /// Node installs are a single attempt: npm's own retry and cache
    /// behavior makes re-running a failed install in a loop unproductive.
    async fn install_node(&self, dir: &Path) {
        info!(dir = %dir.display(), "Installing Node.js dependencies");
        let spec = CommandSpec::new(&["npm", "install", "--legacy-peer-deps"]).in_dir(dir);
        match self.runner.run(&spec, self.policy.attempt_timeout).await {
            Ok(out) if out.success => {
                info!(dir = %dir.display(), "Node.js dependencies installed");
            }
            Ok(out) => {
                error!(
                    dir = %dir.display(),
                    stderr = %out.stderr.trim(),
                    "npm install failed"
                );
            }
            Err(e) => {
                error!(dir = %dir.display(), error = %e, "npm install could not run");
            }
        }
    }
}
