//! Terminal stand-in for a view layer
//!
//! Prints every transition as it reaches the view and completes it after a
//! simulated animation delay.

use crate::scenario::Screen;
use nav_core::Destination;
use nav_orchestrator::{Completion, NavigationView, ViewError, ViewHandles};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Behaviour shared by every view in one hierarchy
struct Shared {
    delay: Duration,
    /// Destination whose push is never completed
    stall: Option<String>,
    /// Withheld completions, kept alive so they time out instead of dropping
    stalled: Mutex<Vec<Completion>>,
}

pub struct ConsoleView {
    screen: Option<Arc<Screen>>,
    depth: usize,
    shared: Arc<Shared>,
}

impl ConsoleView {
    pub fn root(delay: Duration, stall: Option<String>) -> Self {
        Self {
            screen: None,
            depth: 0,
            shared: Arc::new(Shared {
                delay,
                stall,
                stalled: Mutex::new(Vec::new()),
            }),
        }
    }

    fn nested(&self, screen: Arc<Screen>) -> Arc<dyn NavigationView<Screen>> {
        Arc::new(ConsoleView {
            screen: Some(screen),
            depth: self.depth + 1,
            shared: Arc::clone(&self.shared),
        })
    }

    fn host(&self) -> &str {
        self.screen.as_ref().map_or("window", |screen| screen.name.as_str())
    }

    fn print(&self, verb: &str, detail: String) {
        println!(
            "  {:indent$}{} {} {}",
            "",
            format!("{:<6}", verb).cyan(),
            detail,
            format!("(in {})", self.host()).dimmed(),
            indent = self.depth * 2
        );
    }

    fn finish(&self, completion: Completion) {
        let delay = self.shared.delay;
        if delay.is_zero() {
            completion.complete();
            return;
        }
        thread::spawn(move || {
            thread::sleep(delay);
            completion.complete();
        });
    }

    fn stalls_on(&self, name: &str) -> bool {
        self.shared.stall.as_deref() == Some(name)
    }
}

impl NavigationView<Screen> for ConsoleView {
    fn push(
        &self,
        destination: &Destination<Screen>,
        completion: Completion,
    ) -> Result<Arc<dyn NavigationView<Screen>>, ViewError> {
        let screen = destination.create();
        self.print("push", screen.name.green().to_string());
        if self.stalls_on(&screen.name) {
            self.shared.stalled.lock().push(completion);
        } else {
            self.finish(completion);
        }
        Ok(self.nested(screen))
    }

    fn pop(&self, destination: &Destination<Screen>, completion: Completion) -> Result<(), ViewError> {
        let name = destination.key().to_string();
        self.print("pop", name.red().to_string());
        self.finish(completion);
        Ok(())
    }

    fn change(
        &self,
        to_pop: &[Destination<Screen>],
        to_push: &[Destination<Screen>],
        completion: Completion,
    ) -> Result<ViewHandles<Screen>, ViewError> {
        let mut handles = ViewHandles::new();
        let mut pushed = Vec::with_capacity(to_push.len());
        for destination in to_push {
            let screen = destination.create();
            pushed.push(screen.name.clone());
            handles.insert(destination.key(), self.nested(screen));
        }
        let popped: Vec<String> = to_pop.iter().map(|d| d.key().to_string()).collect();

        self.print(
            "change",
            format!(
                "[{}] -> [{}]",
                popped.join(", ").red(),
                pushed.join(", ").green()
            ),
        );
        self.finish(completion);
        Ok(handles)
    }

    fn change_active_destination(&self, destination: &Destination<Screen>, completion: Completion) {
        self.print("select", destination.key().to_string().yellow().to_string());
        self.finish(completion);
    }

    fn select_active_destination(&self, destination: &Destination<Screen>, completion: Completion) {
        self.print("reselect", destination.key().to_string().yellow().to_string());
        self.finish(completion);
    }
}
