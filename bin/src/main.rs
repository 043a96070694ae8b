//! pdpanel CLI binary.
//!
//! Runs the behaviour PD panel preparation stages over CSV files.

mod cmd;
mod data;
mod logging;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process;

use cmd::spells::SpellsArgs;
use cmd::targets::TargetsArgs;
use cmd::weights::WeightsArgs;

#[derive(Parser)]
#[command(name = "pdpanel")]
#[command(about = "Behaviour PD panel preparation", long_about = None)]
#[command(version)]
struct Cli {
    /// Raise the log level (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Segment entity histories into spells and keep the performing rows
    Spells(SpellsArgs),

    /// Append EVER/OVER target columns
    Targets(TargetsArgs),

    /// Append a sample weight column, or print the weight audit
    Weights(WeightsArgs),

    /// List the default targets and the weighting strategies
    List {
        /// Show detailed information
        #[arg(short, long)]
        detailed: bool,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut log_config = logging::logging_config_from_env();
    log_config.apply_verbosity(cli.verbose);
    logging::init_logging(&log_config)?;

    match cli.command {
        Commands::Spells(args) => cmd::spells::run(args)?,
        Commands::Targets(args) => cmd::targets::run(args)?,
        Commands::Weights(args) => cmd::weights::run(args)?,
        Commands::List { detailed } => cmd::list::run(detailed),
    }

    Ok(())
}
