//! Per-ecosystem environment-variable access patterns

use regex::Regex;
use std::sync::OnceLock;

/// File extensions scanned for environment-variable references.
pub const SCAN_EXTENSIONS: &[&str] = &[
    ".py", ".js", ".jsx", ".ts", ".tsx", ".php", ".env", ".sol", ".vy", ".fe", ".move", ".ink",
    ".rs", ".toml",
];

/// Compiled access patterns. Each carries exactly one capture group holding
/// the variable name.
pub fn env_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            // Python
            r#"os\.getenv\(['"](\w+)['"]\)"#,
            r#"os\.environ\.get\(['"](\w+)['"]\)"#,
            r#"os\.environ\[['"](\w+)['"]\]"#,
            // JavaScript / TypeScript
            r"process\.env\.([A-Z_]+)",
            // PHP
            r#"getenv\(['"](\w+)['"]\)"#,
            r#"\$_ENV\[['"](\w+)['"]\]"#,
            r#"\$_SERVER\[['"](\w+)['"]\]"#,
            // Solidity annotation comments
            r"//\s*Environment\s*Variable\s*:\s*(\w+)",
            r"//\s*ENV\s*VAR\s*:\s*(\w+)",
            // Vyper annotation comments
            r"#\s*Environment\s*Variable\s*:\s*(\w+)",
            r"#\s*ENV\s*VAR\s*:\s*(\w+)",
            // Foundry cheatcodes
            r#"vm\.envString\(['"](\w+)['"]\)"#,
            r#"vm\.envAddress\(['"](\w+)['"]\)"#,
            r#"vm\.envUint\(['"](\w+)['"]\)"#,
            // Rust
            r#"env!\(['"](\w+)['"]\)"#,
            r#"env::var\(['"](\w+)['"]\)"#,
            // Anchor / Solana decorators
            r#"@envvar\(['"](\w+)['"]\)"#,
            // NEAR
            r#"near_env\(['"](\w+)['"]\)"#,
            // Conventional Web3 config keys on assignment lines
            r"\b(\w*RPC_URL\w*)\s*[:=]",
            r"\b(\w*PRIVATE_KEY\w*)\s*[:=]",
            r"\b(\w*MNEMONIC\w*)\s*[:=]",
            r"\b(\w*API_KEY\w*)\s*[:=]",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("valid regex"))
        .collect()
    })
}

/// Whether a filename has one of the scanned extensions.
pub fn is_scannable(filename: &str) -> bool {
    SCAN_EXTENSIONS.iter().any(|ext| filename.ends_with(ext))
}
