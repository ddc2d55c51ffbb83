//! Scenario files
//!
//! A scenario names a root destination and an ordered list of steps, each
//! one navigation action addressed by user identifier:
//!
//! ```toml
//! root = "tabs"
//!
//! [[steps]]
//! action = "add_children"
//! parent = "tabs"
//! children = ["home", "search"]
//! active = "home"
//!
//! [[steps]]
//! action = "push"
//! destination = "article"
//! ```

use anyhow::{Context, Result};
use nav_core::Destination;
use nav_state::{NavigationAction, NavigationState};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// What a scenario destination materializes into
#[derive(Debug, PartialEq, Eq)]
pub struct Screen {
    pub name: String,
}

pub fn destination(name: &str) -> Destination<Screen> {
    let owned = name.to_string();
    Destination::named(name, move |_| Arc::new(Screen { name: owned.clone() }))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case", deny_unknown_fields)]
pub enum Step {
    /// Push onto the active route
    Push { destination: String },
    /// Remove the active leaf
    Pop,
    /// Remove a named destination and its subtree
    Remove { destination: String },
    AddChildren {
        parent: String,
        children: Vec<String>,
        #[serde(default)]
        active: Option<String>,
    },
    /// Replace the parent's active child
    Replace { parent: String, destination: String },
    Select { parent: String, child: String },
    SetRoot { destination: String },
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Push { destination } => write!(f, "push {}", destination),
            Step::Pop => write!(f, "pop"),
            Step::Remove { destination } => write!(f, "remove {}", destination),
            Step::AddChildren { parent, children, active } => {
                write!(f, "add [{}] to {}", children.join(", "), parent)?;
                if let Some(active) = active {
                    write!(f, " ({} active)", active)?;
                }
                Ok(())
            }
            Step::Replace { parent, destination } => write!(f, "replace in {} with {}", parent, destination),
            Step::Select { parent, child } => write!(f, "select {} in {}", child, parent),
            Step::SetRoot { destination } => write!(f, "set root {}", destination),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub root: String,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Failed to parse scenario")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario: {}", path.display()))?;
        Self::from_toml_str(&contents).with_context(|| format!("Invalid scenario: {}", path.display()))
    }

    /// Navigation state before any step, then after each step
    pub fn states(&self) -> Result<Vec<NavigationState<Screen>>> {
        let mut states = Vec::with_capacity(self.steps.len() + 1);
        let mut state = NavigationState::new()
            .reduce(NavigationAction::SetRoot(destination(&self.root)))
            .context("Failed to set scenario root")?;
        states.push(state.clone());

        for (index, step) in self.steps.iter().enumerate() {
            let number = index + 1;
            let action = step
                .to_action(&state)
                .with_context(|| format!("Step {} ({}) is invalid", number, step))?;
            state = state
                .reduce(action)
                .with_context(|| format!("Step {} ({}) was rejected", number, step))?;
            states.push(state.clone());
        }

        Ok(states)
    }
}

impl Step {
    fn to_action(&self, state: &NavigationState<Screen>) -> Result<NavigationAction<Screen>> {
        let action = match self {
            Step::Push { destination: name } => NavigationAction::AddNewDestination(destination(name)),
            Step::Pop => NavigationAction::RemoveCurrentDestination,
            Step::Remove { destination: name } => {
                let instance = state
                    .tree()
                    .and_then(|tree| tree.find_by_user_identifier(name))
                    .map(|node| node.value().instance_identifier())
                    .with_context(|| format!("No destination named '{}'", name))?;
                NavigationAction::RemoveDestination(instance)
            }
            Step::AddChildren { parent, children, active } => NavigationAction::AddChildren {
                parent: parent.clone(),
                destinations: children.iter().map(|name| destination(name)).collect(),
                active: active.as_deref().map(destination),
            },
            Step::Replace { parent, destination: name } => NavigationAction::ReplaceActiveChild {
                parent: parent.clone(),
                destination: destination(name),
            },
            Step::Select { parent, child } => NavigationAction::select(parent.as_str(), child.as_str()),
            Step::SetRoot { destination: name } => NavigationAction::SetRoot(destination(name)),
        };
        Ok(action)
    }
}
