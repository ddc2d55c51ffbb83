//! Command implementations

pub mod config;
pub mod diff;
pub mod replay;
