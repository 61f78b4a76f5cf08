//! Required environment-variable detection
//!
//! If the repository root already carries dot-env files, their names are
//! taken as the answer and their values seed any unset process variables;
//! no source scanning happens. Otherwise source files are scanned against a
//! per-ecosystem pattern table. Nested git checkouts are excluded from the
//! walk and scanned as repositories of their own, with results merged.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub mod env_file;
pub mod patterns;

pub use env_file::{merge_env_content, parse_env_content, parse_env_file};
pub use patterns::{env_patterns, is_scannable, SCAN_EXTENSIONS};

use crate::installer::{is_subrepository, EXCLUDED_DIRS};

/// Detect the environment variables this repository needs.
///
/// Mutates the process environment when dot-env values are found: unset or
/// empty variables are seeded from the file. This is the only write side
/// effect in the scan path.
pub fn scan(root: &Path) -> BTreeSet<String> {
    let env_files = root_env_files(root);
    if !env_files.is_empty() {
        info!(
            root = %root.display(),
            files = ?env_files.iter().filter_map(|f| f.file_name()).collect::<Vec<_>>(),
            "Using existing env files, skipping source scan"
        );
        return seed_from_env_files(&env_files);
    }

    let mut vars = BTreeSet::new();
    let mut subrepos: Vec<PathBuf> = Vec::new();
    scan_sources(root, &mut vars, &mut subrepos);

    for subrepo in subrepos {
        debug!(dir = %subrepo.display(), "Scanning nested repository separately");
        vars.extend(scan(&subrepo));
    }

    vars
}

/// Dot-env files directly under the root, sorted by name.
fn root_env_files(root: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(root) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter(|e| e.file_name().to_string_lossy().starts_with(".env"))
        .map(|e| e.path())
        .collect();
    files.sort();
    files
}

fn seed_from_env_files(env_files: &[PathBuf]) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for path in env_files {
        for (name, value) in parse_env_file(path) {
            let unset = std::env::var(&name).map(|v| v.is_empty()).unwrap_or(true);
            if unset {
                // The scan phase runs on the single control thread.
                std::env::set_var(&name, &value);
                debug!(name = %name, "Seeded process environment from env file");
            }
            names.insert(name);
        }
    }
    names
}

/// Recursive source walk under one repository. Nested checkouts are
/// collected, not descended into.
fn scan_sources(root: &Path, vars: &mut BTreeSet<String>, subrepos: &mut Vec<PathBuf>) {
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Cannot read directory during env scan");
                continue;
            }
        };
        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            let name = entry.file_name();
            let name = name.to_string_lossy().into_owned();
            if path.is_dir() {
                if name.starts_with('.') || EXCLUDED_DIRS.contains(&name.as_str()) {
                    continue;
                }
                if is_subrepository(&path) {
                    subrepos.push(path);
                } else {
                    stack.push(path);
                }
            } else if is_scannable(&name) {
                scan_file(&path, vars);
            }
        }
    }
}

fn scan_file(path: &Path, vars: &mut BTreeSet<String>) {
    // Binary or otherwise undecodable files are silently skipped.
    let Ok(content) = std::fs::read_to_string(path) else {
        return;
    };
    for pattern in env_patterns() {
        for cap in pattern.captures_iter(&content) {
            if let Some(name) = cap.get(1) {
                vars.insert(name.as_str().to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_collects_across_languages() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("app.py"),
            "import os\ntoken = os.getenv('GH_TOKEN')\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("deploy.js"),
            "const rpc = process.env.MAINNET_RPC;\n",
        )
        .unwrap();
        fs::write(dir.path().join("README.md"), "PRETEND_VAR=1\n").unwrap();

        let vars = scan(dir.path());
        assert!(vars.contains("GH_TOKEN"));
        assert!(vars.contains("MAINNET_RPC"));
        assert!(!vars.contains("PRETEND_VAR"));
    }

    #[test]
    fn test_excluded_dirs_are_not_scanned() {
        let dir = TempDir::new().unwrap();
        let nm = dir.path().join("node_modules/pkg");
        fs::create_dir_all(&nm).unwrap();
        fs::write(nm.join("index.js"), "process.env.VENDORED_VAR\n").unwrap();
        fs::write(
            dir.path().join("index.js"),
            "const x = process.env.REAL_VAR;\n",
        )
        .unwrap();

        let vars = scan(dir.path());
        assert!(vars.contains("REAL_VAR"));
        assert!(!vars.contains("VENDORED_VAR"));
    }

    #[test]
    fn test_nested_repository_scanned_independently_and_merged() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("main.py"), "os.getenv('OUTER_VAR')\n").unwrap();

        let nested = dir.path().join("vendor-checkout");
        fs::create_dir_all(nested.join(".git")).unwrap();
        fs::write(nested.join("inner.py"), "os.getenv('INNER_VAR')\n").unwrap();

        let vars = scan(dir.path());
        assert!(vars.contains("OUTER_VAR"));
        assert!(vars.contains("INNER_VAR"));
    }

    #[test]
    #[serial]
    fn test_env_file_short_circuits_source_scan() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".env"), "FROM_FILE_A=x\nFROM_FILE_B=y\n").unwrap();
        fs::write(dir.path().join("app.py"), "os.getenv('FROM_SOURCE')\n").unwrap();

        let vars = scan(dir.path());
        assert!(vars.contains("FROM_FILE_A"));
        assert!(vars.contains("FROM_FILE_B"));
        assert!(!vars.contains("FROM_SOURCE"));

        std::env::remove_var("FROM_FILE_A");
        std::env::remove_var("FROM_FILE_B");
    }

    #[test]
    #[serial]
    fn test_env_file_seeds_only_unset_variables() {
        let dir = TempDir::new().unwrap();
        std::env::set_var("SEED_ALREADY_SET", "keep-me");
        std::env::remove_var("SEED_FRESH");
        fs::write(
            dir.path().join(".env"),
            "SEED_ALREADY_SET=clobber\nSEED_FRESH=value\n",
        )
        .unwrap();

        scan(dir.path());
        assert_eq!(std::env::var("SEED_ALREADY_SET").unwrap(), "keep-me");
        assert_eq!(std::env::var("SEED_FRESH").unwrap(), "value");

        std::env::remove_var("SEED_ALREADY_SET");
        std::env::remove_var("SEED_FRESH");
    }

    #[test]
    fn test_empty_repository_yields_empty_set() {
        let dir = TempDir::new().unwrap();
        assert!(scan(dir.path()).is_empty());
    }
}
