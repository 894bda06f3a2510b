//! Error types for the support copilot.
//!
//! One enum covers every failure category in the workspace. Infrastructure
//! failures (store, provider transport) abort a run; answer-quality problems
//! are never errors and travel as validation data instead.

use thiserror::Error;

/// Unified error type for the support copilot.
///
/// All fallible functions return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// An evidence corpus could not be reached or loaded. Fatal for a run.
    #[error("Evidence store unavailable: {0}")]
    StoreUnavailable(String),

    /// The answer generator did not produce a structurally valid answer.
    #[error("Generator returned a malformed answer: {0}")]
    GenerationMalformed(String),

    /// An answer could not be serialized or parsed for validation.
    #[error("Validation input malformed: {0}")]
    ValidationInputMalformed(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LLM provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Prompt loading and rendering errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether this error ends a run abnormally instead of feeding the retry loop.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            AppError::GenerationMalformed(_) | AppError::ValidationInputMalformed(_)
        )
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
