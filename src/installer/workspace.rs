//! Nested npm workspace handling
//!
//! A conventionally-named `indexer/` sub-directory carrying its own
//! package.json is treated as an npm workspace extracted from a monorepo.
//! The `workspace:` version-linking protocol only resolves inside the
//! original monorepo, so it is neutralized to `*` before installing at the
//! workspace root and in each immediate package/service directory.

use crate::exec::{CommandRunner, CommandSpec, RetryPolicy};
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;
use tracing::{info, warn};

pub const WORKSPACE_DIR: &str = "indexer";
pub const WORKSPACE_CHILD_DIRS: &[&str] = &["packages", "services"];

const NPM_INSTALL: &[&str] = &["npm", "install", "--legacy-peer-deps"];

/// Rewrite `workspace:` dependency references to `*` in every package.json
/// under the workspace root. Returns how many manifests changed. Re-running
/// on an already-rewritten tree changes nothing (fixed point).
pub fn neutralize_workspace_links(workspace_root: &Path) -> Result<usize> {
    let mut changed = 0;
    let mut stack = vec![workspace_root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Cannot read workspace directory");
                continue;
            }
        };
        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if path.is_dir() {
                if name == "node_modules" || name.starts_with('.') {
                    continue;
                }
                stack.push(path);
            } else if name == "package.json" {
                match rewrite_manifest(&path) {
                    Ok(true) => changed += 1,
                    Ok(false) => {}
                    Err(e) => warn!(path = %path.display(), error = %e, "Failed to process manifest"),
                }
            }
        }
    }

    Ok(changed)
}

/// Replace `workspace:` versions with `*` in one manifest. Only writes when
/// something actually changed.
fn rewrite_manifest(path: &Path) -> Result<bool> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mut data: Value =
        serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display()))?;

    let mut changed = false;
    for section in ["dependencies", "devDependencies"] {
        if let Some(deps) = data.get_mut(section).and_then(Value::as_object_mut) {
            for (_, version) in deps.iter_mut() {
                if let Some(v) = version.as_str() {
                    if v.starts_with("workspace:") {
                        *version = Value::String("*".to_string());
                        changed = true;
                    }
                }
            }
        }
    }

    if changed {
        let rendered = serde_json::to_string_pretty(&data)?;
        std::fs::write(path, rendered)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(changed)
}

/// Install the workspace: root first, then each immediate child package and
/// service directory. Individual failures are logged, never fatal.
pub async fn install_workspace<R: CommandRunner + ?Sized>(
    runner: &R,
    workspace_root: &Path,
    policy: &RetryPolicy,
) -> Result<()> {
    let changed = neutralize_workspace_links(workspace_root)?;
    info!(
        workspace = %workspace_root.display(),
        manifests_rewritten = changed,
        "Installing npm workspace dependencies"
    );

    run_npm_install(runner, workspace_root, policy).await;

    for child_dir in WORKSPACE_CHILD_DIRS {
        let parent = workspace_root.join(child_dir);
        let Ok(entries) = std::fs::read_dir(&parent) else {
            continue;
        };
        let mut children: Vec<_> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        children.sort();
        for child in children {
            run_npm_install(runner, &child, policy).await;
        }
    }

    Ok(())
}

async fn run_npm_install<R: CommandRunner + ?Sized>(
    runner: &R,
    dir: &Path,
    policy: &RetryPolicy,
) {
    let spec = CommandSpec::new(NPM_INSTALL).in_dir(dir);
    match runner.run(&spec, policy.attempt_timeout).await {
        Ok(out) if out.success => {
            info!(dir = %dir.display(), "Workspace dependencies installed");
        }
        Ok(out) => {
            warn!(
                dir = %dir.display(),
                stderr = %out.stderr.trim(),
                "Workspace install failed"
            );
        }
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "Workspace install could not run");
        }
    }
}
