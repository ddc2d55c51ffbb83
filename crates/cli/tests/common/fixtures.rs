//! Scenario fixtures

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Tab bar: push into one tab, switch tabs and back, then swap a tab out
pub const TABS_SCENARIO: &str = r#"
root = "tabs"

[[steps]]
action = "add_children"
parent = "tabs"
children = ["home", "search"]
active = "home"

[[steps]]
action = "push"
destination = "article"

[[steps]]
action = "select"
parent = "tabs"
child = "search"

[[steps]]
action = "push"
destination = "results"

[[steps]]
action = "select"
parent = "tabs"
child = "home"

[[steps]]
action = "remove"
destination = "article"

[[steps]]
action = "replace"
parent = "tabs"
destination = "settings"
"#;

/// Grow a tab while it is inactive, switch to it, then tap it again
pub const INACTIVE_TAB_SCENARIO: &str = r#"
root = "tabs"

[[steps]]
action = "add_children"
parent = "tabs"
children = ["home", "search"]
active = "home"

[[steps]]
action = "add_children"
parent = "search"
children = ["results"]
active = "results"

[[steps]]
action = "select"
parent = "tabs"
child = "search"

[[steps]]
action = "push"
destination = "detail"

[[steps]]
action = "select"
parent = "tabs"
child = "search"
"#;

/// Temporary directory holding scenario and config files
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: TempDir::new().context("Failed to create temp dir")?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to `name` and return its path as a string
    pub fn write(&self, name: &str, contents: &str) -> Result<String> {
        let path: PathBuf = self.dir.path().join(name);
        std::fs::write(&path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path.to_string_lossy().into_owned())
    }
}
