use crate::analyze::{run_analysis, AnalyzeArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use curriculum_gap::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Curriculum Gap Identifier",
    about = "Compare a curriculum against a standard and report the coverage gaps",
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
    /// Analyze a curriculum/standard pair in the foreground and print the gaps
    Analyze(AnalyzeArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Analyze(args) => run_analysis(args).await,
    }
}
