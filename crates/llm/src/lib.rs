//! LLM integration crate for the support copilot.
//!
//! Provides a provider-agnostic abstraction for completion calls, used by the
//! answer generator and the judge.
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (default)
//! - **OpenAI**: api.openai.com or any compatible `/chat/completions` server
//!
//! # Example
//! ```no_run
//! use copilot_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Hello, world!", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod json;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use json::extract_json_object;
pub use providers::{OllamaClient, OpenAiClient};
pub use types::ProviderType;
