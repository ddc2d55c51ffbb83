//! Replay a scenario through the orchestrator and a console view

use crate::cmd::config;
use crate::console::ConsoleView;
use crate::scenario::{Scenario, Screen};
use anyhow::{Context, Result};
use nav_orchestrator::{MainQueue, NavigationView, Orchestrator};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Debug, Clone, Default)]
pub struct ReplayOptions {
    /// Simulated animation length per transition
    pub delay: Duration,
    /// Overrides the configured completion timeout
    pub timeout_ms: Option<u64>,
    pub config: Option<PathBuf>,
    /// Never complete the push of this destination
    pub stall: Option<String>,
    /// Print the tree after every step
    pub show_trees: bool,
}

pub fn run(scenario_path: &Path, options: &ReplayOptions) -> Result<()> {
    let scenario = Scenario::load(scenario_path)?;
    let states = scenario.states()?;

    let mut config = config::load(options.config.as_deref())?;
    if let Some(timeout_ms) = options.timeout_ms {
        config.completion_timeout_ms = timeout_ms;
    }
    config.validate()?;

    let queue = MainQueue::spawn(config.main_thread_name.clone()).context("Failed to start main queue")?;
    let root: Arc<dyn NavigationView<Screen>> = Arc::new(ConsoleView::root(options.delay, options.stall.clone()));
    let orchestrator = Orchestrator::new(root, Arc::new(queue), config).context("Failed to start orchestrator")?;

    info!(
        "Replaying {} ({} steps, delay {:?})",
        scenario_path.display(),
        scenario.steps.len(),
        options.delay
    );
    let started = Instant::now();
    println!("{} {}", "Replaying".bold(), scenario_path.display());

    let mut transitions = 0;
    for (step, state) in states.iter().enumerate() {
        let title = match step {
            0 => format!("root {}", scenario.root),
            _ => scenario.steps[step - 1].to_string(),
        };
        println!("{} {}", format!("[{}]", step).dimmed(), title.bold());

        let report = orchestrator
            .apply_and_wait(state.tree())
            .with_context(|| format!("Step {} ({}) failed", step, title))?;
        if report.transitions.is_empty() {
            println!("  {}", "no transitions".dimmed());
        }
        debug!("Step {} finished {} transitions", step, report.transitions.len());
        transitions += report.transitions.len();

        if options.show_trees {
            if let Some(tree) = state.tree() {
                for line in tree.outline().lines() {
                    println!("    {}", line.dimmed());
                }
            }
        }
    }

    orchestrator.shutdown()?;
    info!(
        "Replay finished: {} transitions in {:?}",
        transitions,
        started.elapsed()
    );
    println!(
        "\n{} {} steps, {} transitions",
        "✓".green(),
        states.len(),
        transitions
    );
    Ok(())
}
