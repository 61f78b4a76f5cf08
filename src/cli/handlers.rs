use super::commands::CliArgs;
use super::prompt::{provision_missing_vars, ConsolePrompt};
use crate::exec::SystemRunner;
use crate::pipeline::Bootstrap;
use crate::stack::HostOs;
use std::sync::Arc;
use tracing::{error, info};

/// Run the full bootstrap for the CLI. Returns the process exit code.
pub async fn handle_bootstrap(args: &CliArgs) -> i32 {
    let os = match HostOs::detect() {
        Ok(os) => os,
        Err(e) => {
            error!("{e}");
            return 1;
        }
    };

    let runner = Arc::new(SystemRunner::new());
    let bootstrap = Bootstrap::new(runner, os, args.dest.clone());

    let report = match bootstrap.run(&args.repo_url).await {
        Ok(report) => report,
        Err(e) => {
            error!("Bootstrap failed: {e:#}");
            return 1;
        }
    };

    if report.env_vars.is_empty() {
        info!("No required environment variables detected");
    } else if let Err(e) =
        provision_missing_vars(&report.repo_path, &report.env_vars, &ConsolePrompt)
    {
        error!("Failed to provision environment variables: {e:#}");
        return 1;
    }

    info!(repo = %report.repo_path.display(), "Repository is ready");
    0
}
