//! Command handlers for the support copilot CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod ask;
pub mod eval;
pub mod search;
mod setup;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use eval::EvalCommand;
pub use search::SearchCommand;
