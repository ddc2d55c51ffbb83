//! Snapshot-driven transition orchestration
//!
//! The orchestrator keeps the last snapshot it applied. Each call to
//! `apply` queues a cycle; a single worker thread diffs the queued snapshot
//! against the retained one, consulting its view registry for which nodes
//! are actually on screen, and performs the resulting instructions in
//! order. Each instruction is dispatched to the main executor and the worker
//! blocks until the view signals its `Completion`, so at most one transition
//! is ever in flight.
//!
//! A view that misses the completion deadline, drops its completion, fails,
//! or leaves the view registry inconsistent breaks the model/UI agreement.
//! The orchestrator then logs the violation, marks itself failed, and
//! refuses further work.

use crate::config::OrchestratorConfig;
use crate::error::{OrchestratorError, ViewError};
use crate::executor::MainExecutor;
use crate::view::{Completion, NavigationView};
use crate::Result;
use ahash::AHashMap;
use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use nav_core::{Destination, DestinationKey, NavigationTree, TransitionInstruction, TransitionTarget, TreeDiff};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorStatus {
    Running,
    /// Stopped by a contract violation; the error is returned by every call
    Failed(OrchestratorError),
    Stopped,
}

impl OrchestratorStatus {
    fn failure(&self) -> Option<OrchestratorError> {
        match self {
            OrchestratorStatus::Failed(err) => Some(err.clone()),
            _ => None,
        }
    }
}

/// Summary of a finished cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub cycle: u64,
    /// Executed instructions in order, in their log form
    pub transitions: Vec<String>,
    pub elapsed: Duration,
}

/// Handle to a queued cycle
#[derive(Debug)]
pub struct CycleTicket {
    cycle: u64,
    receiver: Receiver<Result<CycleReport>>,
}

impl CycleTicket {
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Block until the cycle has run
    pub fn wait(self) -> Result<CycleReport> {
        self.receiver
            .recv()
            .unwrap_or(Err(OrchestratorError::ShutDown))
    }
}

struct Job<V> {
    cycle: u64,
    snapshot: Option<NavigationTree<V>>,
    reply: Sender<Result<CycleReport>>,
}

/// Drives a view hierarchy to match successive navigation snapshots
pub struct Orchestrator<V> {
    jobs: Option<Sender<Job<V>>>,
    worker: Option<JoinHandle<()>>,
    status: Arc<Mutex<OrchestratorStatus>>,
    next_cycle: AtomicU64,
}

impl<V: Send + Sync + 'static> Orchestrator<V> {
    /// Start an orchestrator whose root destination is shown by `root`
    ///
    /// View callbacks run on `executor`. Blocking on a cycle from inside a
    /// view callback deadlocks when the executor is a `MainQueue`.
    pub fn new(
        root: Arc<dyn NavigationView<V>>,
        executor: Arc<dyn MainExecutor>,
        config: OrchestratorConfig,
    ) -> Result<Self> {
        config.validate()?;

        let status = Arc::new(Mutex::new(OrchestratorStatus::Running));
        let (tx, rx) = unbounded::<Job<V>>();
        let worker = Worker {
            root,
            executor,
            timeout: config.completion_timeout(),
            abort_on_contract_violation: config.abort_on_contract_violation,
            retained: None,
            views: AHashMap::new(),
            status: Arc::clone(&status),
        };
        let handle = thread::Builder::new()
            .name(config.worker_thread_name.clone())
            .spawn(move || worker.run(rx))
            .map_err(|e| OrchestratorError::Spawn(e.to_string()))?;

        info!(
            "Orchestrator started (completion timeout: {:?})",
            config.completion_timeout()
        );

        Ok(Self {
            jobs: Some(tx),
            worker: Some(handle),
            status,
            next_cycle: AtomicU64::new(0),
        })
    }

    /// Queue a cycle that brings the UI in line with `snapshot`
    ///
    /// The snapshot is deep-copied before this returns, so the caller may
    /// keep mutating its tree. `None` tears the whole hierarchy down.
    pub fn apply(&self, snapshot: Option<&NavigationTree<V>>) -> Result<CycleTicket> {
        if let Some(err) = self.status.lock().failure() {
            return Err(err);
        }
        let jobs = self.jobs.as_ref().ok_or(OrchestratorError::ShutDown)?;

        let cycle = self.next_cycle.fetch_add(1, Ordering::Relaxed) + 1;
        let (reply, receiver) = bounded(1);
        jobs.send(Job {
            cycle,
            snapshot: snapshot.map(NavigationTree::deep_copy),
            reply,
        })
        .map_err(|_| OrchestratorError::ShutDown)?;
        trace!("Queued cycle {}", cycle);

        Ok(CycleTicket { cycle, receiver })
    }

    /// `apply`, then wait for the cycle to finish
    pub fn apply_and_wait(&self, snapshot: Option<&NavigationTree<V>>) -> Result<CycleReport> {
        self.apply(snapshot)?.wait()
    }
}

impl<V> Orchestrator<V> {
    pub fn status(&self) -> OrchestratorStatus {
        self.status.lock().clone()
    }

    /// Finish queued cycles and stop the worker
    ///
    /// Returns the failure if the orchestrator had stopped on one.
    pub fn shutdown(mut self) -> Result<()> {
        self.stop();
        match self.status.lock().failure() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn stop(&mut self) {
        self.jobs.take();
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                error!("Orchestrator worker panicked");
            }
        }
        let mut status = self.status.lock();
        if *status == OrchestratorStatus::Running {
            *status = OrchestratorStatus::Stopped;
        }
    }
}

impl<V> Drop for Orchestrator<V> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// View shown for a destination, and the destination whose view hosts it
struct ViewEntry<V> {
    view: Arc<dyn NavigationView<V>>,
    parent: Option<DestinationKey>,
}

struct Worker<V> {
    root: Arc<dyn NavigationView<V>>,
    executor: Arc<dyn MainExecutor>,
    timeout: Duration,
    abort_on_contract_violation: bool,
    retained: Option<NavigationTree<V>>,
    views: AHashMap<DestinationKey, ViewEntry<V>>,
    status: Arc<Mutex<OrchestratorStatus>>,
}

impl<V: Send + Sync + 'static> Worker<V> {
    fn run(mut self, jobs: Receiver<Job<V>>) {
        for job in jobs.iter() {
            let failure = self.status.lock().failure();
            let result = match failure {
                Some(err) => Err(err),
                None => {
                    let result = self.run_cycle(job.cycle, job.snapshot);
                    if let Err(err) = &result {
                        self.fail(job.cycle, err);
                    }
                    result
                }
            };
            let _ = job.reply.send(result);
        }
        debug!("Orchestrator worker exiting");
    }

    fn run_cycle(&mut self, cycle: u64, snapshot: Option<NavigationTree<V>>) -> Result<CycleReport> {
        let started = Instant::now();
        let views = &self.views;
        let diff = TreeDiff::diff_shown(self.retained.as_ref(), snapshot.as_ref(), |destination| {
            views.contains_key(&destination.key())
        });
        for (previous, current) in diff.rekeyed() {
            self.rekey(previous, current);
        }
        if diff.is_empty() {
            trace!("Cycle {}: nothing to do", cycle);
        } else {
            debug!("Cycle {}: {} instructions", cycle, diff.len());
        }

        let mut transitions = Vec::with_capacity(diff.len());
        let mut failure = None;
        for instruction in diff {
            let label = instruction.to_string();
            trace!("Cycle {}: {}", cycle, label);
            if let Err(err) = self.execute(instruction, &label) {
                failure = Some(err);
                break;
            }
            transitions.push(label);
        }

        // Remaining instructions of a failed cycle are abandoned
        self.retained = snapshot;

        match failure {
            Some(err) => Err(err),
            None => {
                if !transitions.is_empty() {
                    info!("Cycle {} finished {} transitions", cycle, transitions.len());
                }
                Ok(CycleReport {
                    cycle,
                    transitions,
                    elapsed: started.elapsed(),
                })
            }
        }
    }

    fn fail(&self, cycle: u64, err: &OrchestratorError) {
        error!("Navigation contract violated in cycle {}: {}", cycle, err);
        *self.status.lock() = OrchestratorStatus::Failed(err.clone());
        if self.abort_on_contract_violation && err.is_contract_violation() {
            std::process::abort();
        }
    }

    fn execute(&mut self, instruction: TransitionInstruction<V>, label: &str) -> Result<()> {
        match instruction {
            TransitionInstruction::Push(TransitionTarget {
                destination,
                parent: None,
            }) => {
                self.bind_root(&destination);
                Ok(())
            }
            TransitionInstruction::Push(TransitionTarget {
                destination,
                parent: Some(parent),
            }) => {
                let view = self.view_for(&parent, label)?;
                let pushed = destination.clone();
                let child = self.transition(label, move |completion| view.push(&pushed, completion))?;
                self.views.insert(
                    destination.key(),
                    ViewEntry {
                        view: child,
                        parent: Some(parent.key()),
                    },
                );
                Ok(())
            }
            TransitionInstruction::Pop(TransitionTarget {
                destination,
                parent: None,
            }) => {
                self.unbind(destination.key());
                Ok(())
            }
            TransitionInstruction::Pop(TransitionTarget {
                destination,
                parent: Some(parent),
            }) => {
                let view = self.view_for(&parent, label)?;
                let popped = destination.clone();
                self.transition(label, move |completion| view.pop(&popped, completion))?;
                self.unbind(destination.key());
                Ok(())
            }
            TransitionInstruction::Change {
                parent: None,
                pop,
                push,
            } => {
                for destination in &pop {
                    self.unbind(destination.key());
                }
                for destination in &push {
                    self.bind_root(destination);
                }
                Ok(())
            }
            TransitionInstruction::Change {
                parent: Some(parent),
                pop,
                push,
            } => {
                let view = self.view_for(&parent, label)?;
                let (to_pop, to_push) = (pop.clone(), push.clone());
                let mut handles =
                    self.transition(label, move |completion| view.change(&to_pop, &to_push, completion))?;

                for destination in &pop {
                    self.unbind(destination.key());
                }
                let parent_key = parent.key();
                for destination in &push {
                    let view = handles.remove(&destination.key()).ok_or_else(|| {
                        OrchestratorError::IncompleteChange {
                            instruction: label.to_string(),
                            destination: destination.to_string(),
                        }
                    })?;
                    self.views.insert(
                        destination.key(),
                        ViewEntry {
                            view,
                            parent: Some(parent_key.clone()),
                        },
                    );
                }
                Ok(())
            }
            TransitionInstruction::SelectActiveChild(TransitionTarget { parent: None, .. }) => Ok(()),
            TransitionInstruction::SelectActiveChild(TransitionTarget {
                destination,
                parent: Some(parent),
            }) => {
                let view = self.view_for(&parent, label)?;
                self.transition(label, move |completion| {
                    view.change_active_destination(&destination, completion);
                    Ok(())
                })
            }
            TransitionInstruction::ReselectActiveChild(TransitionTarget { parent: None, .. }) => Ok(()),
            TransitionInstruction::ReselectActiveChild(TransitionTarget {
                destination,
                parent: Some(parent),
            }) => {
                let view = self.view_for(&parent, label)?;
                self.transition(label, move |completion| {
                    view.select_active_destination(&destination, completion);
                    Ok(())
                })
            }
        }
    }

    /// Run `op` on the main executor and wait for both its return value and
    /// its completion, sharing one deadline
    fn transition<T, F>(&self, label: &str, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(Completion) -> std::result::Result<T, ViewError> + Send + 'static,
    {
        let (done_tx, done_rx) = bounded::<()>(1);
        let (outcome_tx, outcome_rx) = bounded(1);
        let completion = Completion::new(done_tx);
        let deadline = Instant::now() + self.timeout;

        self.executor
            .execute(Box::new(move || {
                let _ = outcome_tx.send(op(completion));
            }))
            .map_err(|_| OrchestratorError::ExecutorUnavailable {
                instruction: label.to_string(),
            })?;

        let value = match outcome_rx.recv_deadline(deadline) {
            Ok(Ok(value)) => value,
            Ok(Err(source)) => {
                return Err(OrchestratorError::View {
                    instruction: label.to_string(),
                    source,
                })
            }
            Err(RecvTimeoutError::Timeout) => return Err(self.timed_out(label)),
            Err(RecvTimeoutError::Disconnected) => {
                return Err(OrchestratorError::ExecutorUnavailable {
                    instruction: label.to_string(),
                })
            }
        };

        match done_rx.recv_deadline(deadline) {
            Ok(()) => Ok(value),
            Err(RecvTimeoutError::Timeout) => Err(self.timed_out(label)),
            Err(RecvTimeoutError::Disconnected) => Err(OrchestratorError::CompletionDropped {
                instruction: label.to_string(),
            }),
        }
    }

    fn timed_out(&self, label: &str) -> OrchestratorError {
        OrchestratorError::CompletionTimeout {
            instruction: label.to_string(),
            timeout: self.timeout,
        }
    }

    fn view_for(&self, parent: &Destination<V>, label: &str) -> Result<Arc<dyn NavigationView<V>>> {
        self.views
            .get(&parent.key())
            .map(|entry| Arc::clone(&entry.view))
            .ok_or_else(|| OrchestratorError::MissingParentView {
                instruction: label.to_string(),
                parent: parent.to_string(),
            })
    }

    fn bind_root(&mut self, destination: &Destination<V>) {
        self.views.insert(
            destination.key(),
            ViewEntry {
                view: Arc::clone(&self.root),
                parent: None,
            },
        );
    }

    /// Move the view bound under `previous` to `current`
    fn rekey(&mut self, previous: &DestinationKey, current: &DestinationKey) {
        let Some(entry) = self.views.remove(previous) else {
            return;
        };
        debug!("Rekeyed view {} -> {}", previous, current);
        self.views.insert(current.clone(), entry);
        for entry in self.views.values_mut() {
            if entry.parent.as_ref() == Some(previous) {
                entry.parent = Some(current.clone());
            }
        }
    }

    /// Forget the view for `key` and every view nested under it
    fn unbind(&mut self, key: DestinationKey) {
        let mut doomed = vec![key];
        while let Some(key) = doomed.pop() {
            self.views.remove(&key);
            doomed.extend(
                self.views
                    .iter()
                    .filter(|(_, entry)| entry.parent.as_ref() == Some(&key))
                    .map(|(child, _)| child.clone()),
            );
        }
    }
}
