//! Orchestrator errors

use std::time::Duration;
use thiserror::Error;

/// Failure reported by a view while performing a transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    /// The view does not support this transition
    #[error("`{0}` is not implemented by this view")]
    Unimplemented(&'static str),

    #[error("{0}")]
    Failed(String),
}

/// Errors surfaced by the orchestrator
///
/// Everything except `ShutDown`, `InvalidConfig` and `Spawn` is a contract
/// violation: the model and the UI can no longer be assumed to agree, so the
/// orchestrator stops and every later call returns the same error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrchestratorError {
    #[error("completion for `{instruction}` was not signalled within {timeout:?}")]
    CompletionTimeout { instruction: String, timeout: Duration },

    #[error("completion for `{instruction}` was dropped without being signalled")]
    CompletionDropped { instruction: String },

    #[error("`{instruction}` returned no view for pushed destination {destination}")]
    IncompleteChange { instruction: String, destination: String },

    #[error("no view is registered for {parent}, required by `{instruction}`")]
    MissingParentView { instruction: String, parent: String },

    #[error("view failed to perform `{instruction}`: {source}")]
    View {
        instruction: String,
        #[source]
        source: ViewError,
    },

    #[error("main execution context dropped `{instruction}` without running it")]
    ExecutorUnavailable { instruction: String },

    #[error("orchestrator has shut down")]
    ShutDown,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to spawn orchestrator worker: {0}")]
    Spawn(String),
}

impl OrchestratorError {
    /// Whether the view layer broke its side of the transition contract
    pub fn is_contract_violation(&self) -> bool {
        !matches!(
            self,
            OrchestratorError::ShutDown | OrchestratorError::InvalidConfig(_) | OrchestratorError::Spawn(_)
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, OrchestratorError::CompletionTimeout { .. })
    }
}
