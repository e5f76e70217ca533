//! crewloop CLI: the main entry point.
//!
//! Commands:
//! - `run`    : Drive a goal through the supervisor loop
//! - `memory` : Show recorded memory rows, newest first
//! - `status` : Show effective configuration
//! - `onboard`: Write a default config file

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "crewloop",
    about = "crewloop: a supervisor agent loop over a hosted language model",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the supervisor loop for a goal
    Run {
        /// What the team should accomplish
        goal: String,

        /// Print the final state as JSON instead of a transcript
        #[arg(long)]
        json: bool,
    },

    /// Show recorded memory rows
    Memory {
        /// Maximum rows to show (defaults to memory.fetch_limit)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Whose rows to show (defaults to the configured identity)
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Show effective configuration
    Status,

    /// Write a default configuration file
    Onboard,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run { goal, json } => commands::run::run(goal, json).await?,
        Commands::Memory { limit, user } => commands::memory::run(limit, user).await?,
        Commands::Status => commands::status::run().await?,
        Commands::Onboard => commands::onboard::run().await?,
    }

    Ok(())
}
