//! Transition orchestration for navtree
//!
//! This crate provides:
//! - `Orchestrator`: diffs successive snapshots and drives the transitions
//!   through the view layer one at a time
//! - `NavigationView`: the contract a view layer implements
//! - `Completion`: the one-shot acknowledgment for a single transition
//! - `MainQueue` / `InlineExecutor`: execution contexts for view callbacks
//! - `OrchestratorConfig`: timeouts and failure policy

pub mod config;
pub mod error;
pub mod executor;
pub mod orchestrator;
pub mod view;

pub use config::OrchestratorConfig;
pub use error::{OrchestratorError, ViewError};
pub use executor::{ExecutorClosed, InlineExecutor, MainExecutor, MainQueue, Task};
pub use orchestrator::{CycleReport, CycleTicket, Orchestrator, OrchestratorStatus};
pub use view::{Completion, NavigationView, ViewHandles};

/// Result type for orchestrator operations
pub type Result<T> = std::result::Result<T, OrchestratorError>;
