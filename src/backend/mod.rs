//! Remote reasoning backend used by the online analyzer.
//!
//! The backend is a plain prompt-in, text-out service. [`prompts`] builds the
//! requests and [`response`] holds the strict reply parsers.

pub mod openai;
pub mod prompts;
pub mod response;

use crate::error::AnalysisError;

/// A text-completion service.
pub trait ReasoningBackend {
    /// Send one prompt and return the raw answer text.
    async fn complete(&self, prompt: &str) -> Result<String, AnalysisError>;
}
