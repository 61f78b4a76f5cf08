//! repoboot - bootstrap an arbitrary source repository into a runnable state
//!
//! This library clones a previously-unseen repository and drives it to a
//! runnable state: it fingerprints the tree for dependency-manifest signals,
//! provisions the package managers those signals require, resolves and
//! switches to compatible tool versions, installs dependencies across every
//! nested project and workspace, and detects the environment variables the
//! project needs at runtime.
//!
//! # Core Concepts
//!
//! - **Fingerprinting**: mapping manifest filenames (lockfiles, config
//!   files) to the package manager that consumes them
//! - **Provisioning**: making sure each required manager binary is present
//!   and functional, installing it with OS-specific commands when missing
//! - **Version switching**: deriving tool/runtime version constraints from
//!   manifest metadata and lockfile formats and switching to a compatible
//!   version, restarting the phase loop when the runtime itself changes
//! - **Installation walk**: a sequential top-down tree walk that runs the
//!   matching install command in every directory holding a manifest,
//!   respecting exclusions, nested checkouts, and workspace semantics
//!
//! # Example Usage
//!
//! ```ignore
//! use repoboot::exec::SystemRunner;
//! use repoboot::pipeline::Bootstrap;
//! use repoboot::stack::HostOs;
//! use std::sync::Arc;
//!
//! async fn bootstrap_repo(url: &str) -> anyhow::Result<()> {
//!     let runner = Arc::new(SystemRunner::new());
//!     let bootstrap = Bootstrap::new(runner, HostOs::detect()?, "repositories");
//!     let report = bootstrap.run(url).await?;
//!     println!("checkout: {}", report.repo_path.display());
//!     println!("needs: {:?}", report.env_vars);
//!     Ok(())
//! }
//! ```
//!
//! # Project Structure
//!
//! - [`fingerprint`]: manifest signal tables and required-manager detection
//! - [`provision`]: parallel package-manager provisioning
//! - [`versions`]: version constraint resolution and switching
//! - [`installer`]: the dependency-installation tree walk
//! - [`envscan`]: environment-variable detection
//! - [`pipeline`]: the phase driver tying it all together

// Public modules
pub mod cli;
pub mod envscan;
pub mod error;
pub mod exec;
pub mod fingerprint;
pub mod git;
pub mod installer;
pub mod pipeline;
pub mod provision;
pub mod stack;
pub mod versions;

// Re-export key types for convenient access
pub use error::BootstrapError;
pub use exec::{CommandRunner, CommandSpec, RetryPolicy, SystemRunner};
pub use pipeline::{Bootstrap, BootstrapReport};
pub use stack::{HostOs, ManagerId, ToolId};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
