//! navtree CLI - navtree command

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

mod cmd;
mod console;
mod logging;
mod scenario;

/// navtree - Drive a view hierarchy from navigation tree snapshots
#[derive(Parser)]
#[command(name = "navtree")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scenario through the orchestrator with a console view
    Replay {
        /// Scenario file (TOML)
        scenario: PathBuf,
        /// Simulated animation length per transition in milliseconds
        #[arg(long, default_value = "0")]
        delay_ms: u64,
        /// Completion timeout in milliseconds (overrides the config file)
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Configuration file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Never complete the push of this destination
        #[arg(long)]
        stall: Option<String>,
        /// Print the tree after every step
        #[arg(long)]
        trees: bool,
    },
    /// Show the transitions between two scenario steps
    Diff {
        /// Scenario file (TOML)
        scenario: PathBuf,
        /// Starting step (0 = root only)
        #[arg(long, default_value = "0")]
        from: usize,
        /// Target step
        #[arg(long)]
        to: usize,
        /// Print both trees
        #[arg(long)]
        trees: bool,
    },
    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration
    Show {
        /// Configuration file (defaults when omitted)
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Flushes the file writer on exit
    let _log_guard = logging::init(cli.verbose, cli.log_file.as_deref())?;

    match cli.command {
        Commands::Replay {
            scenario,
            delay_ms,
            timeout_ms,
            config,
            stall,
            trees,
        } => {
            let options = cmd::replay::ReplayOptions {
                delay: Duration::from_millis(delay_ms),
                timeout_ms,
                config,
                stall,
                show_trees: trees,
            };
            cmd::replay::run(&scenario, &options)
        }
        Commands::Diff {
            scenario,
            from,
            to,
            trees,
        } => cmd::diff::run(&scenario, from, to, trees),
        Commands::Config(ConfigCommands::Show { file }) => cmd::config::run_show(file.as_deref()),
    }
}
