use clap::Parser;
use std::path::PathBuf;

/// Bootstrap an arbitrary source repository into a runnable state
#[derive(Parser, Debug)]
#[command(
    name = "repoboot",
    about = "Bootstrap an arbitrary source repository into a runnable state",
    version,
    author,
    long_about = "repoboot clones a repository, detects which language and package \
                  ecosystems it uses, provisions the matching tooling, switches to \
                  compatible tool versions, installs dependencies across every nested \
                  project, and detects the environment variables the project needs."
)]
pub struct CliArgs {
    /// Repository URL to clone and bootstrap
    #[arg(value_name = "REPO_URL")]
    pub repo_url: String,

    /// Directory checkouts are placed under
    #[arg(long, value_name = "DIR", default_value = "repositories")]
    pub dest: PathBuf,

    #[arg(long, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, help = "Verbose output")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}
