//! Missing environment-variable prompting and persistence
//!
//! The scan phase only reports names; collecting values is console glue kept
//! behind the [`EnvPrompt`] seam so it stays testable. Provided values are
//! exported to the process and persisted through the env-file merge.

use crate::envscan::merge_env_content;
use anyhow::{Context, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Name fragments that mark a variable as sensitive.
const SENSITIVE_MARKERS: &[&str] = &["PASSWORD", "SECRET", "KEY", "TOKEN"];

pub fn is_sensitive(name: &str) -> bool {
    let upper = name.to_uppercase();
    SENSITIVE_MARKERS.iter().any(|m| upper.contains(m))
}

/// Source of values for variables the scan found but the environment lacks.
pub trait EnvPrompt {
    fn read_value(&self, name: &str, sensitive: bool) -> Result<String>;
}

/// Interactive stdin prompt.
pub struct ConsolePrompt;

impl EnvPrompt for ConsolePrompt {
    fn read_value(&self, name: &str, sensitive: bool) -> Result<String> {
        let note = if sensitive { " (sensitive)" } else { "" };
        print!("Enter value for environment variable '{name}'{note}: ");
        std::io::stdout().flush()?;
        let mut value = String::new();
        std::io::stdin()
            .read_line(&mut value)
            .context("failed to read from stdin")?;
        Ok(value.trim_end_matches(['\r', '\n']).to_string())
    }
}

/// Prompt for every detected variable that is unset or empty, export the
/// provided values, and persist them to the repository's env file.
pub fn provision_missing_vars(
    repo_path: &Path,
    detected: &BTreeSet<String>,
    prompt: &dyn EnvPrompt,
) -> Result<()> {
    let missing: Vec<&String> = detected
        .iter()
        .filter(|name| std::env::var(name.as_str()).map(|v| v.is_empty()).unwrap_or(true))
        .collect();

    if missing.is_empty() {
        if !detected.is_empty() {
            info!("All detected environment variables are already set");
        }
        return Ok(());
    }

    let mut provided = BTreeMap::new();
    for name in missing {
        let value = prompt.read_value(name, is_sensitive(name))?;
        std::env::set_var(name, &value);
        info!(name = %name, "Environment variable set");
        provided.insert(name.clone(), value);
    }

    persist_vars(repo_path, &provided)
}

/// Write values into the first env file at the repository root, creating
/// `.env` when none exists. Existing assignments for other keys survive.
fn persist_vars(repo_path: &Path, provided: &BTreeMap<String, String>) -> Result<()> {
    let target = first_env_file(repo_path).unwrap_or_else(|| repo_path.join(".env"));
    let existing = std::fs::read_to_string(&target).unwrap_or_default();
    let merged = merge_env_content(&existing, provided);
    std::fs::write(&target, &merged)
        .with_context(|| format!("failed to write {}", target.display()))?;
    info!(file = %target.display(), count = provided.len(), "Persisted environment variables");
    Ok(())
}

fn first_env_file(repo_path: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(repo_path).ok()?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter(|e| e.file_name().to_string_lossy().starts_with(".env"))
        .map(|e| e.path())
        .collect();
    files.sort();
    files.into_iter().next()
}
