//! Version-constraint resolution from manifests and lockfiles
//!
//! Produces opaque version-expression strings; nothing here interprets a
//! range beyond prefix checks. Priority: explicit engines field >
//! dependency hints > lockfile format hints > fixed fallbacks. Read or parse
//! failures degrade to conservative legacy constraints and are never fatal.

use crate::stack::ToolId;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

// Treated as tunable constants, not invariants: the thresholds encode "which
// node majors does this package generation tolerate".
const MODERN_NODE: &str = ">=14.0.0";
const LEGACY_NODE: &str = "<=16.0.0";
const MIXED_NODE: &str = ">=14.0.0 <=16.0.0";
const MODERN_NPM: &str = ">=7.0.0";
const LEGACY_NPM: &str = "<=6.14.0";
const TS4_NODE: &str = ">=14.0.0";
const TS5_NODE: &str = ">=16.0.0";

/// Package-name → node-range hints, consulted only when no engines field
/// exists. `<=` entries mark legacy toolchains, `>=` entries modern ones.
const NODE_HINTS: &[(&str, &str)] = &[
    // Web3 and blockchain tools
    ("ganache-core", "<=16.0.0"),
    ("truffle", "<=16.0.0"),
    ("hardhat", ">=14.0.0"),
    ("web3", ">=12.0.0"),
    ("ethers", ">=12.0.0"),
    // Common frameworks
    ("react", ">=12.0.0"),
    ("next", ">=14.0.0"),
    ("vue", ">=12.0.0"),
    ("angular", ">=14.0.0"),
    ("svelte", ">=14.0.0"),
    // Build tools
    ("webpack", ">=12.0.0"),
    ("vite", ">=14.0.0"),
    ("esbuild", ">=14.0.0"),
    ("rollup", ">=12.0.0"),
    // Testing frameworks
    ("jest", ">=12.0.0"),
    ("mocha", ">=12.0.0"),
    ("cypress", ">=14.0.0"),
    // Legacy packages
    ("gulp", "<=16.0.0"),
    ("grunt", "<=14.0.0"),
    ("bower", "<=14.0.0"),
];

/// Resolve required tool/runtime versions for the project at `root`.
///
/// Returns an empty map when nothing can be inferred. At most one expression
/// per identifier survives.
pub fn resolve(root: &Path) -> HashMap<ToolId, String> {
    let mut versions = HashMap::new();

    let package_json = root.join("package.json");
    if package_json.is_file() {
        match std::fs::read_to_string(&package_json)
            .map_err(anyhow::Error::from)
            .and_then(|text| serde_json::from_str::<Value>(&text).map_err(Into::into))
        {
            Ok(data) => resolve_from_package_json(&data, &mut versions),
            Err(e) => {
                warn!(error = %e, "Could not parse package.json, using fallback versions");
                versions.insert(ToolId::Node, LEGACY_NODE.to_string());
                versions.insert(ToolId::Npm, LEGACY_NPM.to_string());
            }
        }
    }

    // Lockfile formats contribute only for identifiers still unresolved, and
    // only ever for their own manager.
    if !versions.contains_key(&ToolId::Yarn) {
        if let Some(expr) = yarn_lockfile_hint(root) {
            versions.insert(ToolId::Yarn, expr);
        }
    }
    if !versions.contains_key(&ToolId::Npm) {
        if let Some(expr) = npm_lockfile_hint(root) {
            versions.insert(ToolId::Npm, expr);
        }
    }

    debug!(?versions, "Resolved version constraints");
    versions
}

fn resolve_from_package_json(data: &Value, versions: &mut HashMap<ToolId, String>) {
    let engines = data.get("engines").cloned().unwrap_or(Value::Null);

    if let Some(node) = engines.get("node").and_then(Value::as_str) {
        // Explicit requirement is authoritative, copied verbatim.
        versions.insert(ToolId::Node, node.to_string());
    } else {
        let deps = combined_dependencies(data);
        versions.insert(ToolId::Node, node_from_hints(&deps));

        // TypeScript major version can imply a newer runtime minimum.
        if let Some(ts) = deps.get("typescript") {
            if ts.starts_with("^4") || ts.starts_with("~4") {
                versions.insert(ToolId::Node, TS4_NODE.to_string());
            } else if ts.starts_with("^5") || ts.starts_with("~5") {
                versions.insert(ToolId::Node, TS5_NODE.to_string());
            }
        }
    }

    if let Some(yarn) = engines.get("yarn").and_then(Value::as_str) {
        versions.insert(ToolId::Yarn, yarn.to_string());
    }
    if let Some(npm) = engines.get("npm").and_then(Value::as_str) {
        versions.insert(ToolId::Npm, npm.to_string());
    } else {
        let legacy_node = versions
            .get(&ToolId::Node)
            .map(|v| v.starts_with("<=16"))
            .unwrap_or(false);
        let npm = if legacy_node { LEGACY_NPM } else { MODERN_NPM };
        versions.insert(ToolId::Npm, npm.to_string());
    }
}

fn combined_dependencies(data: &Value) -> HashMap<String, String> {
    let mut deps = HashMap::new();
    for section in ["dependencies", "devDependencies"] {
        if let Some(map) = data.get(section).and_then(Value::as_object) {
            for (name, version) in map {
                if let Some(v) = version.as_str() {
                    deps.insert(name.clone(), v.to_string());
                }
            }
        }
    }
    deps
}

fn node_from_hints(deps: &HashMap<String, String>) -> String {
    let constraints: Vec<&str> = NODE_HINTS
        .iter()
        .filter(|(pkg, _)| deps.contains_key(*pkg))
        .map(|(_, constraint)| *constraint)
        .collect();

    if constraints.is_empty() {
        return MODERN_NODE.to_string();
    }

    let has_legacy = constraints.iter().any(|c| c.starts_with("<="));
    let has_modern = constraints.iter().any(|c| c.starts_with(">="));

    match (has_legacy, has_modern) {
        // Conflicting hints resolve to a compatible middle ground.
        (true, true) => MIXED_NODE.to_string(),
        (true, false) => LEGACY_NODE.to_string(),
        _ => MODERN_NODE.to_string(),
    }
}

fn yarn_lockfile_hint(root: &Path) -> Option<String> {
    let content = std::fs::read_to_string(root.join("yarn.lock")).ok()?;
    let re = Regex::new(r"# yarn lockfile v(\d+)").expect("valid regex");
    let version: u32 = re.captures(&content)?.get(1)?.as_str().parse().ok()?;
    Some(if version == 1 {
        "1.x".to_string() // Classic Yarn
    } else {
        ">=2.0.0".to_string()
    })
}

fn npm_lockfile_hint(root: &Path) -> Option<String> {
    let content = std::fs::read_to_string(root.join("package-lock.json")).ok()?;
    let data: Value = serde_json::from_str(&content).ok()?;
    let lockfile_version = data
        .get("lockfileVersion")
        .and_then(Value::as_u64)
        .unwrap_or(1);
    Some(match lockfile_version {
        1 => LEGACY_NPM.to_string(),
        _ => MODERN_NPM.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use yare::parameterized;

    fn write_repo(package_json: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), package_json).unwrap();
        dir
    }

    #[test]
    fn test_explicit_engines_wins_over_hints() {
        let dir = write_repo(
            r#"{
                "engines": { "node": ">=18.0.0" },
                "dependencies": { "ganache-core": "2.x", "react": "^17.0.0" }
            }"#,
        );
        let versions = resolve(dir.path());
        assert_eq!(versions[&ToolId::Node], ">=18.0.0");
    }

    #[test]
    fn test_conflicting_hints_yield_combined_range() {
        let dir = write_repo(
            r#"{"dependencies": { "ganache-core": "2.x", "hardhat": "^2.0.0" }}"#,
        );
        let versions = resolve(dir.path());
        assert_eq!(versions[&ToolId::Node], ">=14.0.0 <=16.0.0");
    }

    #[parameterized(
        legacy_only = { r#"{"dependencies": {"gulp": "^3.9.1"}}"#, "<=16.0.0" },
        modern_only = { r#"{"dependencies": {"vite": "^4.0.0"}}"#, ">=14.0.0" },
        no_hints = { r#"{"dependencies": {"left-pad": "1.0.0"}}"#, ">=14.0.0" },
        typescript_four = { r#"{"devDependencies": {"typescript": "^4.9.0"}}"#, ">=14.0.0" },
        typescript_five = { r#"{"devDependencies": {"typescript": "^5.2.0"}}"#, ">=16.0.0" },
    )]
    fn test_node_hint_resolution(package_json: &str, expected: &str) {
        let dir = write_repo(package_json);
        let versions = resolve(dir.path());
        assert_eq!(versions[&ToolId::Node], expected);
    }

    #[test]
    fn test_npm_follows_legacy_node() {
        let dir = write_repo(r#"{"dependencies": {"gulp": "^3.9.1"}}"#);
        let versions = resolve(dir.path());
        assert_eq!(versions[&ToolId::Npm], "<=6.14.0");
    }

    #[test]
    fn test_npm_engines_verbatim() {
        let dir = write_repo(r#"{"engines": {"npm": "^9.0.0", "yarn": ">=1.22"}}"#);
        let versions = resolve(dir.path());
        assert_eq!(versions[&ToolId::Npm], "^9.0.0");
        assert_eq!(versions[&ToolId::Yarn], ">=1.22");
    }

    #[test]
    fn test_malformed_manifest_falls_back() {
        let dir = write_repo("{ this is not json");
        let versions = resolve(dir.path());
        assert_eq!(versions[&ToolId::Node], "<=16.0.0");
        assert_eq!(versions[&ToolId::Npm], "<=6.14.0");
    }

    #[test]
    fn test_no_manifest_yields_empty() {
        let dir = TempDir::new().unwrap();
        assert!(resolve(dir.path()).is_empty());
    }

    #[parameterized(
        classic = { "# yarn lockfile v1\n\nleft-pad@^1.0.0:\n", "1.x" },
        berry = { "# yarn lockfile v2\n", ">=2.0.0" },
    )]
    fn test_yarn_lockfile_hint(content: &str, expected: &str) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("yarn.lock"), content).unwrap();
        let versions = resolve(dir.path());
        assert_eq!(versions[&ToolId::Yarn], expected);
        // Lockfiles never speak for the runtime.
        assert!(!versions.contains_key(&ToolId::Node));
    }

    #[parameterized(
        v1 = { r#"{"lockfileVersion": 1}"#, "<=6.14.0" },
        v2 = { r#"{"lockfileVersion": 2}"#, ">=7.0.0" },
        v3 = { r#"{"lockfileVersion": 3}"#, ">=7.0.0" },
        missing = { r#"{}"#, "<=6.14.0" },
    )]
    fn test_npm_lockfile_hint(content: &str, expected: &str) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package-lock.json"), content).unwrap();
        let versions = resolve(dir.path());
        assert_eq!(versions[&ToolId::Npm], expected);
    }

    #[test]
    fn test_engines_npm_suppresses_lockfile_hint() {
        let dir = write_repo(r#"{"engines": {"npm": ">=8.0.0"}}"#);
        fs::write(
            dir.path().join("package-lock.json"),
            r#"{"lockfileVersion": 1}"#,
        )
        .unwrap();
        let versions = resolve(dir.path());
        assert_eq!(versions[&ToolId::Npm], ">=8.0.0");
    }
}
