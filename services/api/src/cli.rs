use crate::commands::{run_assess, run_batch, run_validate, run_wizard};
use crate::server;
use ai_compliance::error::AppError;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "AI Act Compliance Engine",
    about = "Classify AI systems against a versioned AI Act ruleset, over HTTP or from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Assess a single system profile stored as JSON
    Assess(AssessArgs),
    /// Print the guided assessment steps for a risk category
    Wizard(WizardArgs),
    /// Load and validate a ruleset document without serving it
    Validate(ValidateArgs),
    /// Assess every system listed in a CSV export
    Batch(BatchArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Serve this ruleset document instead of the configured one
    #[arg(long)]
    pub(crate) ruleset: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct AssessArgs {
    /// JSON file containing one system profile
    #[arg(long)]
    pub(crate) profile: PathBuf,
    /// Ruleset document to assess against (defaults to the configured one)
    #[arg(long)]
    pub(crate) ruleset: Option<PathBuf>,
    /// Emit the full assessment as JSON instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct WizardArgs {
    /// Risk category, e.g. `high` or `limited`
    pub(crate) category: String,
    /// Ruleset document providing the templates (defaults to the configured one)
    #[arg(long)]
    pub(crate) ruleset: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct ValidateArgs {
    /// Ruleset document to validate
    pub(crate) ruleset: PathBuf,
}

#[derive(Args, Debug)]
pub(crate) struct BatchArgs {
    /// CSV export with one system per row
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Ruleset document to assess against (defaults to the configured one)
    #[arg(long)]
    pub(crate) ruleset: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Assess(args) => run_assess(args),
        Command::Wizard(args) => run_wizard(args),
        Command::Validate(args) => run_validate(args),
        Command::Batch(args) => run_batch(args),
    }
}
