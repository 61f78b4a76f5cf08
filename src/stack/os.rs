//! Host operating system detection
//!
//! The provisioning tables are keyed by OS; anything outside the closed set
//! is a fatal condition before any work starts.

use crate::error::BootstrapError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostOs {
    Linux,
    MacOs,
    Windows,
}

impl HostOs {
    pub fn detect() -> Result<Self, BootstrapError> {
        Self::from_label(std::env::consts::OS)
    }

    pub fn from_label(label: &str) -> Result<Self, BootstrapError> {
        match label {
            "linux" => Ok(Self::Linux),
            "macos" => Ok(Self::MacOs),
            "windows" => Ok(Self::Windows),
            other => Err(BootstrapError::UnsupportedOs(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Linux => "Linux",
            Self::MacOs => "macOS",
            Self::Windows => "Windows",
        }
    }
}

impl std::fmt::Display for HostOs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
