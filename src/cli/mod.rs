//! Command-line interface

pub mod commands;
pub mod handlers;
pub mod prompt;

pub use commands::CliArgs;
pub use handlers::handle_bootstrap;
pub use prompt::{ConsolePrompt, EnvPrompt};
