//! Tool and runtime version handling
//!
//! The resolver derives version-expression strings from manifest metadata
//! and lockfile formats; the switcher turns those expressions into installed
//! reality, possibly requesting a restart of the whole phase loop when the
//! primary runtime has to change underneath us.

pub mod resolver;
pub mod switcher;

pub use resolver::resolve;
pub use switcher::{SwitchOutcome, VersionSwitcher};

use crate::stack::ToolId;
use std::collections::HashMap;

/// Stable apply order: the runtime first, since the npm/yarn switches depend
/// on which node version is active.
pub fn in_apply_order(versions: &HashMap<ToolId, String>) -> Vec<(ToolId, String)> {
    let mut pairs: Vec<_> = versions
        .iter()
        .map(|(tool, expr)| (*tool, expr.clone()))
        .collect();
    pairs.sort_by_key(|(tool, _)| *tool);
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_applies_before_its_managers() {
        let mut versions = HashMap::new();
        versions.insert(ToolId::Yarn, "1.x".to_string());
        versions.insert(ToolId::Node, ">=14.0.0".to_string());
        versions.insert(ToolId::Npm, ">=7.0.0".to_string());

        let ordered = in_apply_order(&versions);
        assert_eq!(ordered[0].0, ToolId::Node);
    }
}
