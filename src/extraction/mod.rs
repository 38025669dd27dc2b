//! LLM-backed symptom extraction.
//!
//! Raw patient text goes to an [`LlmClient`] (Gemini by default, Ollama when
//! configured) with a fixed instruction prompt; [`SymptomExtractor`] turns the
//! reply into a lower-cased comma-separated symptom string.

pub mod extractor;
pub mod gemini;
pub mod ollama;
pub mod prompt;
pub mod types;

pub use extractor::*;
pub use gemini::*;
pub use ollama::*;
pub use prompt::*;
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Symptom extractor is not configured: {0}")]
    NotConfigured(String),

    #[error("LLM service is not reachable at {0}")]
    Connection(String),

    #[error("LLM service returned error (status {status}): {body}")]
    ServiceError { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("No recognizable symptoms in input")]
    NoSymptoms,
}

impl ExtractionError {
    /// Whether the failure means the extractor could not be used at all
    /// (as opposed to a bad answer from a working service).
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            ExtractionError::NotConfigured(_) | ExtractionError::Connection(_)
        )
    }
}
