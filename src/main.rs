use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use ptax::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for ptax::AppCommand {
    fn from(cmd: Commands) -> ptax::AppCommand {
        match cmd {
            Commands::Rate => ptax::AppCommand::Rate,
            Commands::Info => ptax::AppCommand::Info,
            Commands::Serve => ptax::AppCommand::Serve,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display the reference rate of the current bimonth
    Rate,
    /// Display the current bimonth without fetching a rate
    Info,
    /// Serve the rate over HTTP
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => ptax::cli::setup::setup(),
        Some(cmd) => ptax::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
