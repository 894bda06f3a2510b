//! Prompt system for the support copilot.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions, compiled in with workspace overrides
//! - Handlebars template rendering

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{builtin_prompt, load_prompt, GENERATE_PROMPT_ID, JUDGE_PROMPT_ID};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition, PromptOutputSpec, PromptSource};
