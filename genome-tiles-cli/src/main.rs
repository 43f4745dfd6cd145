//! genome-tiles CLI - Command-line interface
//!
//! Diagnostics over the genome-tiles library: LOD planning for a viewport,
//! fetching single annotation tiles, validating flat feature files, and
//! inspecting configuration.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use genome_tiles::config::{config_file_path, ConfigFile};
use genome_tiles::logging::{default_log_dir, default_log_file, init_logging};

use commands::{ConfigCommands, FetchArgs, PlanArgs, ValidateArgs};
use error::CliError;

#[derive(Parser)]
#[command(name = "genome-tiles")]
#[command(about = "Inspect genome tile pyramids", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ~/.genome-tiles/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug events to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the LOD, display layers and tiles for a viewport
    Plan(PlanArgs),

    /// Fetch one annotation tile over HTTP and summarize it
    Fetch(FetchArgs),

    /// Reconstruct a flat feature JSON file and report nesting warnings
    Validate(ValidateArgs),

    /// Inspect the configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        e.exit();
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let filter = if cli.verbose { "debug" } else { "warn" };
    let _logging = init_logging(&default_log_dir(), default_log_file(), filter)
        .map_err(|e| CliError::LoggingInit(e.to_string()))?;

    let config_path = cli.config.unwrap_or_else(config_file_path);

    match cli.command {
        Commands::Plan(args) => {
            let config = ConfigFile::load_from(&config_path)?;
            commands::plan::run(&config, &args)
        }
        Commands::Fetch(args) => {
            let config = ConfigFile::load_from(&config_path)?;
            commands::fetch::run(&config, &args).await
        }
        Commands::Validate(args) => commands::validate::run(&args),
        Commands::Config(command) => commands::config::run(command, &config_path),
    }
}
