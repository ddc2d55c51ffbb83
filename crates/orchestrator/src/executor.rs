//! Execution contexts for view callbacks
//!
//! Every call into a `NavigationView` is handed to a `MainExecutor`. UI
//! toolkits generally require this to be the thread that owns the UI; the
//! orchestrator itself never touches views from its worker thread.

use crossbeam_channel::{unbounded, Sender};
use parking_lot::Mutex;
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tracing::{debug, warn};

/// A unit of work for the main execution context
pub type Task = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("main execution context is closed")]
pub struct ExecutorClosed;

/// Somewhere view callbacks can run
pub trait MainExecutor: Send + Sync {
    /// Schedule `task`; it must run at most once
    fn execute(&self, task: Task) -> Result<(), ExecutorClosed>;
}

/// Runs each task immediately on the calling thread
///
/// Useful in tests and for view layers without thread affinity.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineExecutor;

impl MainExecutor for InlineExecutor {
    fn execute(&self, task: Task) -> Result<(), ExecutorClosed> {
        task();
        Ok(())
    }
}

/// A dedicated thread draining tasks in submission order
pub struct MainQueue {
    sender: Mutex<Option<Sender<Task>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
    name: String,
}

impl MainQueue {
    pub fn spawn(name: impl Into<String>) -> std::io::Result<Self> {
        let name = name.into();
        let (tx, rx) = unbounded::<Task>();
        let handle = thread::Builder::new().name(name.clone()).spawn(move || {
            for task in rx.iter() {
                task();
            }
        })?;
        debug!("Main queue '{}' started", name);

        Ok(Self {
            sender: Mutex::new(Some(tx)),
            handle: Mutex::new(Some(handle)),
            name,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the caller is running on this queue's thread
    pub fn is_current(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .map_or(false, |handle| handle.thread().id() == thread::current().id())
    }

    /// Stop accepting tasks, run the ones already queued, then join
    ///
    /// Calling this from a task on the queue itself only closes it.
    pub fn shutdown(&self) {
        self.sender.lock().take();
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                warn!("Main queue '{}' panicked", self.name);
            }
            debug!("Main queue '{}' stopped", self.name);
        }
    }
}

impl MainExecutor for MainQueue {
    fn execute(&self, task: Task) -> Result<(), ExecutorClosed> {
        match self.sender.lock().as_ref() {
            Some(sender) => sender.send(task).map_err(|_| ExecutorClosed),
            None => Err(ExecutorClosed),
        }
    }
}

impl Drop for MainQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}
