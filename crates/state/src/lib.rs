//! Navigation state and the actions that transform it
//!
//! This crate provides:
//! - `NavigationState`: an immutable snapshot holder
//! - `NavigationAction`: the closed set of navigation mutations
//! - a pure reducer (`NavigationState::reduce`)

pub mod action;
pub mod state;

// Re-exports
pub use action::NavigationAction;
pub use state::{NavigationState, StateError};

/// Result type for state operations
pub type Result<T> = std::result::Result<T, StateError>;
