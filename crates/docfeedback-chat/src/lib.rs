//! External LLM completion for feedback generation (OpenAI/Anthropic).
//!
//! Providers stream tokens over SSE; callers that want one completion
//! collect the stream with `providers::complete`.

pub mod config;
pub mod providers;
pub mod types;

pub use config::LLMConfig;
pub use types::*;
