//! Manifest fingerprinting
//!
//! Maps the files present in a repository to the package managers that
//! consume them. The required-manager set is computed from the immediate
//! root listing only; the install-time tree walk applies the same tables
//! per directory.

use crate::stack::ManagerId;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, warn};

pub mod tables;

pub use tables::{provisioning_commands, InstallSpec, MatchRule, INSTALL_SPECS, NODE_FILES};

/// Scan the immediate root directory for manifest signals and return the set
/// of managers needed to install this repository.
///
/// A non-recursive, read-only pass: nested projects are picked up later by
/// the installer's tree walk. An unreadable root is non-fatal and yields an
/// empty set.
pub fn required_managers(root: &Path) -> BTreeSet<ManagerId> {
    let mut managers = BTreeSet::new();

    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(root = %root.display(), error = %e, "Cannot read repository root");
            return managers;
        }
    };

    let files: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter_map(|e| e.file_name().into_string().ok())
        .collect();

    for spec in INSTALL_SPECS {
        if files.iter().any(|f| spec.rule.matches(f)) {
            managers.insert(spec.manager);
        }
    }

    debug!(
        root = %root.display(),
        managers = ?managers.iter().map(|m| m.as_str()).collect::<Vec<_>>(),
        "Fingerprinted required managers"
    );

    managers
}

/// All install specs whose rule matches the given filename.
pub fn specs_for(filename: &str) -> impl Iterator<Item = &'static InstallSpec> + '_ {
    INSTALL_SPECS.iter().filter(move |s| s.rule.matches(filename))
}
