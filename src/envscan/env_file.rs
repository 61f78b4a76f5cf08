//! Dot-env file parsing and merging

use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

/// Parse `NAME=value` pairs from a dot-env file. Blank lines and `#`
/// comments are skipped; surrounding single or double quotes are stripped
/// from values. An unreadable file yields an empty map.
pub fn parse_env_file(path: &Path) -> BTreeMap<String, String> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_env_content(&content),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cannot read env file");
            BTreeMap::new()
        }
    }
}

pub fn parse_env_content(content: &str) -> BTreeMap<String, String> {
    let mut vars = BTreeMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((name, value)) = line.split_once('=') else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        let value = value
            .trim()
            .trim_matches('"')
            .trim_matches('\'')
            .to_string();
        vars.insert(name.to_string(), value);
    }
    vars
}

/// Merge new variables into existing dot-env content, preserving every
/// existing assignment and overriding only the named keys. Pure text in,
/// text out; the caller decides where it lands on disk.
pub fn merge_env_content(existing: &str, new_vars: &BTreeMap<String, String>) -> String {
    let mut merged = parse_env_content(existing);
    for (name, value) in new_vars {
        merged.insert(name.clone(), value.clone());
    }
    let mut out = String::new();
    for (name, value) in &merged {
        out.push_str(name);
        out.push('=');
        out.push_str(value);
        out.push('\n');
    }
    out
}
