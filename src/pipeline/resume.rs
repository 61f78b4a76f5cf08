//! Restart bookkeeping
//!
//! A runtime version switch invalidates everything resolved under the old
//! runtime, so the phase loop restarts from fingerprinting. The state that
//! must survive the restart is tiny and typed: which node version has
//! already been switched to. It is persisted next to the checkout so an
//! interrupted bootstrap resumes instead of ping-ponging between versions.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const RESUME_FILE: &str = ".repoboot-resume.json";

/// Marker file written by older bootstrap runs that re-executed the whole
/// process after a node switch. Consumed once and removed.
const LEGACY_MARKER: &str = ".node_version_change";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeState {
    /// Node version already installed and activated in this bootstrap run.
    pub node_target: Option<String>,
}

impl ResumeState {
    pub fn path(repo_path: &Path) -> PathBuf {
        repo_path.join(RESUME_FILE)
    }

    /// Load persisted state if present. Corrupt state is discarded with a
    /// warning rather than wedging the bootstrap.
    pub fn load(repo_path: &Path) -> Option<Self> {
        let path = Self::path(repo_path);
        let content = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&content) {
            Ok(state) => {
                debug!(path = %path.display(), "Loaded resume state");
                Some(state)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Discarding corrupt resume state");
                None
            }
        }
    }

    pub fn save(&self, repo_path: &Path) -> Result<()> {
        let path = Self::path(repo_path);
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)
            .with_context(|| format!("failed to persist resume state to {}", path.display()))
    }

    pub fn clear(repo_path: &Path) {
        let path = Self::path(repo_path);
        if path.exists() {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!(path = %path.display(), error = %e, "Failed to remove resume state");
            }
        }
    }
}

/// Read and remove the legacy restart marker, returning the node version it
/// recorded, if any.
pub fn consume_legacy_marker(repo_path: &Path) -> Option<String> {
    let path = repo_path.join(LEGACY_MARKER);
    let content = std::fs::read_to_string(&path).ok()?;
    if let Err(e) = std::fs::remove_file(&path) {
        warn!(path = %path.display(), error = %e, "Failed to remove legacy restart marker");
    }
    let version = content.trim().to_string();
    info!(version = %version, "Consumed legacy restart marker");
    Some(version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_save_load_clear_round_trip() {
        let dir = TempDir::new().unwrap();
        let state = ResumeState {
            node_target: Some("16.20.2".to_string()),
        };

        state.save(dir.path()).unwrap();
        assert_eq!(ResumeState::load(dir.path()), Some(state));

        ResumeState::clear(dir.path());
        assert_eq!(ResumeState::load(dir.path()), None);
    }

    #[test]
    fn test_corrupt_state_is_discarded() {
        let dir = TempDir::new().unwrap();
        fs::write(ResumeState::path(dir.path()), "not json{").unwrap();
        assert_eq!(ResumeState::load(dir.path()), None);
    }

    #[test]
    fn test_legacy_marker_consumed_once() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".node_version_change"), "14.21.3\n").unwrap();

        assert_eq!(
            consume_legacy_marker(dir.path()),
            Some("14.21.3".to_string())
        );
        assert!(!dir.path().join(".node_version_change").exists());
        assert_eq!(consume_legacy_marker(dir.path()), None);
    }
}
