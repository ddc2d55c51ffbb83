//! Offline diff between two scenario steps

use crate::scenario::Scenario;
use anyhow::{bail, Result};
use nav_core::{ShownSet, TransitionInstruction, TreeDiff};
use owo_colors::OwoColorize;
use std::path::Path;
use tracing::debug;

pub fn run(scenario_path: &Path, from: usize, to: usize, show_trees: bool) -> Result<()> {
    let scenario = Scenario::load(scenario_path)?;
    let states = scenario.states()?;
    let last = states.len() - 1;
    if from > last || to > last {
        bail!("Steps range from 0 to {} in {}", last, scenario_path.display());
    }

    let (before, after) = (states[from].tree(), states[to].tree());
    if show_trees {
        for (step, tree) in [(from, before), (to, after)] {
            println!("{}", format!("Step {}", step).bold());
            match tree {
                Some(tree) => print!("{}", tree.outline()),
                None => println!("  {}", "(empty)".dimmed()),
            }
            println!();
        }
    }

    // What a replay up to `from` would have on screen
    let mut shown = ShownSet::new();
    let mut previous = None;
    for state in &states[..=from] {
        let step = TreeDiff::diff_shown(previous, state.tree(), |d| shown.contains(d));
        shown.record(&step);
        previous = state.tree();
    }
    debug!("{} destinations shown at step {}", shown.len(), from);

    let diff = TreeDiff::diff_shown(before, after, |d| shown.contains(d));
    if diff.is_empty() {
        println!("{}", "No transitions".dimmed());
        return Ok(());
    }

    println!("{} ({} -> {})", "Transitions".bold(), from, to);
    for (index, instruction) in diff.instructions().iter().enumerate() {
        let parent = instruction
            .parent()
            .map(|parent| parent.key().to_string())
            .unwrap_or_else(|| "window".to_string());
        let text = instruction.to_string();
        let text = match instruction {
            TransitionInstruction::Push(_) => text.green().to_string(),
            TransitionInstruction::Pop(_) => text.red().to_string(),
            TransitionInstruction::Change { .. } => text.cyan().to_string(),
            TransitionInstruction::SelectActiveChild(_) | TransitionInstruction::ReselectActiveChild(_) => {
                text.yellow().to_string()
            }
        };
        println!(
            "  {:>2}. {} {}",
            index + 1,
            text,
            format!("(in {})", parent).dimmed()
        );
    }

    Ok(())
}
