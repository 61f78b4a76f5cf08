//! Fatal error taxonomy
//!
//! Only conditions that make the whole bootstrap pointless are typed here;
//! everything else is retried, skipped, or degraded to a fallback and logged
//! at the site that made the decision.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("unsupported operating system: {0}")]
    UnsupportedOs(String),

    #[error("package manager '{manager}' could not be installed by any candidate command")]
    ProvisioningFailed { manager: String },

    #[error("failed to switch '{tool}' to version '{constraint}'")]
    VersionSwitchFailed { tool: String, constraint: String },

    #[error("failed to clone repository '{url}' after all retries")]
    CloneFailed { url: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_context() {
        let err = BootstrapError::ProvisioningFailed {
            manager: "yarn".to_string(),
        };
        assert!(err.to_string().contains("yarn"));

        let err = BootstrapError::VersionSwitchFailed {
            tool: "node".to_string(),
            constraint: ">=14.0.0".to_string(),
        };
        assert!(err.to_string().contains(">=14.0.0"));
    }
}
