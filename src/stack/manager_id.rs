crate::define_id_enum! {
    /// Package-manager identifier
    ///
    /// Closed set: every manifest signal and install-command table entry is
    /// keyed by one of these, so an unknown manager is a compile error rather
    /// than a runtime lookup miss.
    ManagerId {
        Pip => "pip" : "pip" | "pip3",
        Pipenv => "pipenv" : "Pipenv",
        Npm => "npm" : "npm",
        Yarn => "yarn" : "Yarn",
        Pnpm => "pnpm" : "pnpm",
        Bundler => "bundle" : "Bundler" | "bundler",
        Composer => "composer" : "Composer",
        Maven => "mvn" : "Maven" | "maven",
        Gradle => "gradle" : "Gradle",
        Go => "go" : "Go" | "golang",
        Nuget => "nuget" : "NuGet",
        Cargo => "cargo" : "Cargo",
        Truffle => "truffle" : "Truffle",
        Hardhat => "hardhat" : "Hardhat",
        Solc => "solc" : "solc",
        Vyper => "vyper" : "Vyper",
        Foundry => "foundryup" : "Foundry" | "foundry",
        Anchor => "anchor" : "Anchor",
        Move => "move" : "Move",
        Brownie => "brownie" : "Brownie",
        Substrate => "substrate" : "Substrate",
        Ink => "ink" : "ink!",
        Tezos => "tezos" : "Tezos",
        Near => "near" : "NEAR",
    }
}

impl ManagerId {
    /// Binary probed on PATH to decide whether provisioning is needed
    pub fn binary(&self) -> &'static str {
        self.as_str()
    }

    /// Arguments that make the binary report its version and exit zero.
    pub fn version_args(&self) -> &'static [&'static str] {
        match self {
            // `go --version` exits non-zero; the subcommand form is the one
            // that works.
            Self::Go => &["version"],
            _ => &["--version"],
        }
    }
}
