//! Static manifest and provisioning tables
//!
//! Three fixed mappings drive the whole bootstrap: manifest pattern →
//! owning manager, manifest pattern → install command candidates, and
//! manager × OS → provisioning command sequence. All are immutable consts
//! keyed by closed enums.

use crate::stack::{HostOs, ManagerId};

/// How a manifest filename is recognized: exact name or suffix glob
/// (e.g. `*.sln`). No recursive glob semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRule {
    Exact(&'static str),
    Suffix(&'static str),
}

impl MatchRule {
    pub fn matches(&self, filename: &str) -> bool {
        match self {
            Self::Exact(name) => filename == *name,
            Self::Suffix(suffix) => filename.ends_with(suffix),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Exact(name) => (*name).to_string(),
            Self::Suffix(suffix) => format!("*{suffix}"),
        }
    }
}

/// One manifest signal: which manager owns it and how to install from it.
///
/// `commands` is priority-ordered; the first succeeding candidate wins.
#[derive(Debug)]
pub struct InstallSpec {
    pub rule: MatchRule,
    pub manager: ManagerId,
    pub commands: &'static [&'static [&'static str]],
}

/// Manifest files the tree walk routes away from the generic dispatch; their
/// table entries still contribute to fingerprinting.
pub const NODE_FILES: &[&str] = &[
    "package.json",
    "yarn.lock",
    "package-lock.json",
    "pnpm-lock.yaml",
];

pub const INSTALL_SPECS: &[InstallSpec] = &[
    InstallSpec {
        rule: MatchRule::Exact("requirements.txt"),
        manager: ManagerId::Pip,
        commands: &[
            &["pip", "install", "--no-cache-dir", "--ignore-installed", "--no-deps", "-r", "requirements.txt"],
            &["python", "-m", "pip", "install", "--no-cache-dir", "--ignore-installed", "--no-deps", "-r", "requirements.txt"],
            &["pip3", "install", "--no-cache-dir", "--ignore-installed", "--no-deps", "-r", "requirements.txt"],
        ],
    },
    InstallSpec {
        rule: MatchRule::Exact("requirements-dev.txt"),
        manager: ManagerId::Pip,
        commands: &[
            &["pip", "install", "--no-cache-dir", "--ignore-installed", "--no-deps", "-r", "requirements-dev.txt"],
            &["python", "-m", "pip", "install", "--no-cache-dir", "--ignore-installed", "--no-deps", "-r", "requirements-dev.txt"],
            &["pip3", "install", "--no-cache-dir", "--ignore-installed", "--no-deps", "-r", "requirements-dev.txt"],
        ],
    },
    InstallSpec {
        rule: MatchRule::Exact("Pipfile"),
        manager: ManagerId::Pipenv,
        commands: &[&["pipenv", "install", "--skip-lock"]],
    },
    InstallSpec {
        rule: MatchRule::Exact("Pipfile.lock"),
        manager: ManagerId::Pipenv,
        commands: &[&["pipenv", "install", "--skip-lock"]],
    },
    InstallSpec {
        rule: MatchRule::Exact("package.json"),
        manager: ManagerId::Npm,
        commands: &[&["npm", "install", "--no-optional"]],
    },
    InstallSpec {
        rule: MatchRule::Exact("yarn.lock"),
        manager: ManagerId::Yarn,
        commands: &[&["yarn", "install", "--frozen-lockfile"]],
    },
    InstallSpec {
        rule: MatchRule::Exact("pnpm-lock.yaml"),
        manager: ManagerId::Pnpm,
        commands: &[&["pnpm", "install", "--prod", "--no-optional"]],
    },
    InstallSpec {
        rule: MatchRule::Exact("Gemfile"),
        manager: ManagerId::Bundler,
        commands: &[&["bundle", "install", "--without", "development", "test"]],
    },
    InstallSpec {
        rule: MatchRule::Exact("composer.json"),
        manager: ManagerId::Composer,
        commands: &[&["composer", "install", "--no-dev", "--no-suggest"]],
    },
    InstallSpec {
        rule: MatchRule::Exact("pom.xml"),
        manager: ManagerId::Maven,
        commands: &[&["mvn", "install", "-DskipTests", "-Dmaven.test.skip=true"]],
    },
    InstallSpec {
        rule: MatchRule::Exact("build.gradle"),
        manager: ManagerId::Gradle,
        commands: &[&["gradle", "build", "-x", "test"]],
    },
    InstallSpec {
        rule: MatchRule::Exact("go.mod"),
        manager: ManagerId::Go,
        commands: &[&["go", "mod", "download", "-x"]],
    },
    InstallSpec {
        rule: MatchRule::Exact("truffle-config.js"),
        manager: ManagerId::Truffle,
        commands: &[&["truffle", "compile", "--quiet"]],
    },
    InstallSpec {
        rule: MatchRule::Exact("hardhat.config.js"),
        manager: ManagerId::Hardhat,
        commands: &[&["hardhat", "compile", "--no-typechain"]],
    },
    InstallSpec {
        rule: MatchRule::Exact("Vyperfile.yaml"),
        manager: ManagerId::Vyper,
        commands: &[&["vyper", "--version"]],
    },
    InstallSpec {
        rule: MatchRule::Exact("solidity.json"),
        manager: ManagerId::Solc,
        commands: &[&["solc", "--install", "all"]],
    },
    InstallSpec {
        rule: MatchRule::Suffix(".sln"),
        manager: ManagerId::Nuget,
        commands: &[&["nuget", "restore", "-NonInteractive"]],
    },
    InstallSpec {
        rule: MatchRule::Exact("Cargo.toml"),
        manager: ManagerId::Cargo,
        commands: &[&["cargo", "build", "--no-default-features"]],
    },
    InstallSpec {
        rule: MatchRule::Exact("rust-toolchain.toml"),
        manager: ManagerId::Cargo,
        commands: &[&["rustup", "show"]],
    },
    InstallSpec {
        rule: MatchRule::Exact("rust-toolchain"),
        manager: ManagerId::Cargo,
        commands: &[&["rustup", "show"]],
    },
    InstallSpec {
        rule: MatchRule::Exact("foundry.toml"),
        manager: ManagerId::Foundry,
        commands: &[&["forge", "build"]],
    },
    InstallSpec {
        rule: MatchRule::Exact("remappings.txt"),
        manager: ManagerId::Foundry,
        commands: &[&["forge", "remappings"]],
    },
    InstallSpec {
        rule: MatchRule::Exact("anchor.toml"),
        manager: ManagerId::Anchor,
        commands: &[&["anchor", "build"]],
    },
    InstallSpec {
        rule: MatchRule::Exact("move.toml"),
        manager: ManagerId::Move,
        commands: &[&["move", "build"]],
    },
    InstallSpec {
        rule: MatchRule::Exact("brownie-config.yaml"),
        manager: ManagerId::Brownie,
        commands: &[&["brownie", "compile"]],
    },
    InstallSpec {
        rule: MatchRule::Exact("substrate.toml"),
        manager: ManagerId::Substrate,
        commands: &[&["cargo", "build"]],
    },
    InstallSpec {
        rule: MatchRule::Exact("ink.toml"),
        manager: ManagerId::Ink,
        commands: &[&["cargo", "contract", "build"]],
    },
    InstallSpec {
        rule: MatchRule::Exact("tezos.toml"),
        manager: ManagerId::Tezos,
        commands: &[&["ligo", "compile-contract"]],
    },
    InstallSpec {
        rule: MatchRule::Exact("near.toml"),
        manager: ManagerId::Near,
        commands: &[&["near", "build"]],
    },
];

const RUSTUP_SH: &str =
    "curl --proto '=https' --tlsv1.2 -sSf https://sh.rustup.rs | sh -s -- -y";
const FOUNDRY_SH: &str = "curl -L https://foundry.paradigm.xyz | bash";

/// OS-specific ordered provisioning command sequence for a manager.
///
/// `None` means no provisioning route exists on this host; the manager is
/// skipped with a warning (its installs will then fail and be logged).
pub fn provisioning_commands(
    manager: ManagerId,
    os: HostOs,
) -> Option<&'static [&'static [&'static str]]> {
    use HostOs::*;
    use ManagerId::*;

    let commands: &'static [&'static [&'static str]] = match (manager, os) {
        (Pipenv, _) => &[&["pip", "install", "pipenv"]],
        (Yarn, _) => &[&["npm", "install", "-g", "yarn"]],
        (Npm, _) => &[&["npm", "install", "-g", "npm"]],
        (Bundler, _) => &[&["gem", "install", "bundler"]],
        (Composer, Linux | MacOs) => &[
            &["curl", "-sS", "https://getcomposer.org/installer", "-o", "composer-setup.php"],
            &["php", "composer-setup.php"],
            &["mv", "composer.phar", "/usr/local/bin/composer"],
            &["php", "-r", "unlink('composer-setup.php');"],
        ],
        (Composer, Windows) => &[
            &["php", "composer-setup.php"],
            &["move", "composer.phar", "C:\\Composer\\composer.phar"],
            &["php", "-r", "unlink('composer-setup.php');"],
        ],
        (Maven, MacOs) => &[&["brew", "install", "maven"]],
        (Maven, Linux) => &[&["sudo", "apt-get", "install", "-y", "maven"]],
        (Maven, Windows) => &[&["choco", "install", "maven", "-y"]],
        (Gradle, MacOs) => &[&["brew", "install", "gradle"]],
        (Gradle, Linux) => &[&["sudo", "apt-get", "install", "-y", "gradle"]],
        (Gradle, Windows) => &[&["choco", "install", "gradle", "-y"]],
        (Go, MacOs) => &[&["brew", "install", "go"]],
        (Go, Linux) => &[&["sudo", "apt-get", "install", "-y", "golang"]],
        (Go, Windows) => &[&["choco", "install", "go", "-y"]],
        (Truffle, _) => &[&["npm", "install", "-g", "truffle"]],
        (Hardhat, _) => &[&["npm", "install", "--save-dev", "hardhat"]],
        (Solc, MacOs) => &[&["brew", "install", "solidity"]],
        (Solc, Linux) => &[&["sudo", "apt-get", "install", "-y", "solc"]],
        (Solc, Windows) => &[&["choco", "install", "solidity", "-y"]],
        (Vyper, _) => &[&["pip", "install", "vyper"]],
        (Pnpm, _) => &[&["npm", "install", "-g", "pnpm"]],
        (Nuget, MacOs) => &[&["brew", "install", "nuget"]],
        (Nuget, Linux) => &[&["sudo", "apt-get", "install", "-y", "nuget"]],
        (Nuget, Windows) => &[&["choco", "install", "nuget.commandline", "-y"]],
        (Pip, MacOs) => &[&["brew", "install", "python"]],
        (Pip, Linux) => &[&["sudo", "apt-get", "install", "-y", "python3"]],
        (Pip, Windows) => &[&["choco", "install", "python", "-y"]],
        (Cargo, Linux | MacOs) => &[&["sh", "-c", RUSTUP_SH]],
        (Cargo, Windows) => &[
            &["curl", "--proto", "=https", "--tlsv1.2", "-sSf", "https://win.rustup.rs", "-o", "rustup-init.exe"],
            &["rustup-init.exe", "-y"],
        ],
        (Foundry, _) => &[&["sh", "-c", FOUNDRY_SH]],
        (Anchor, _) => &[&[
            "cargo", "install", "--git", "https://github.com/project-serum/anchor", "anchor-cli",
        ]],
        (Brownie, _) => &[&["pip", "install", "eth-brownie"]],
        (Substrate, _) => &[&["cargo", "install", "substrate-cli-tools"]],
        (Ink, _) => &[&["cargo", "install", "cargo-contract"]],
        (Tezos, _) => &[&["ligo", "compile-contract"]],
        (Near, _) => &[&["npm", "install", "-g", "near-cli"]],
        (Move, _) => return None,
    };
    Some(commands)
}
