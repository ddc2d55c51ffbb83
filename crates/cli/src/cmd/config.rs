//! Configuration inspection command

use anyhow::Result;
use nav_orchestrator::config::{MAX_COMPLETION_TIMEOUT_MS, MIN_COMPLETION_TIMEOUT_MS};
use nav_orchestrator::OrchestratorConfig;
use owo_colors::OwoColorize;
use std::path::Path;

/// Load `file`, or the defaults when no file is given
pub fn load(file: Option<&Path>) -> Result<OrchestratorConfig> {
    match file {
        Some(path) => OrchestratorConfig::load(path),
        None => Ok(OrchestratorConfig::default()),
    }
}

/// Print the effective configuration
pub fn run_show(file: Option<&Path>) -> Result<()> {
    let config = load(file)?;

    println!("{}", "Orchestrator Configuration".bold());
    match file {
        Some(path) => println!("{}: {}\n", "Location".dimmed(), path.display().dimmed()),
        None => println!("{}\n", "(built-in defaults)".dimmed()),
    }

    println!("{}", "[orchestrator]".yellow());
    println!(
        "  {} = {} {}",
        "completion_timeout_ms".cyan(),
        config.completion_timeout_ms,
        format!("({:?})", config.completion_timeout()).dimmed()
    );
    println!(
        "  {} = {}",
        "abort_on_contract_violation".cyan(),
        config.abort_on_contract_violation
    );
    println!(
        "  {} = {:?}",
        "worker_thread_name".cyan(),
        config.worker_thread_name
    );
    println!(
        "  {} = {:?}",
        "main_thread_name".cyan(),
        config.main_thread_name
    );

    println!("\n{}", "Valid Ranges:".bold());
    println!(
        "  completion_timeout_ms: {}-{}",
        MIN_COMPLETION_TIMEOUT_MS, MAX_COMPLETION_TIMEOUT_MS
    );

    Ok(())
}
