use std::sync::Arc;

use async_trait::async_trait;

use super::prompt::{build_extraction_prompt, NO_SYMPTOM_MARKERS};
use super::types::LlmClient;
use super::ExtractionError;

/// Turns raw patient text into a lower-cased comma-separated symptom string.
#[derive(Clone)]
pub struct SymptomExtractor {
    client: Arc<dyn LlmClient>,
}

impl SymptomExtractor {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    pub fn backend(&self) -> &str {
        self.client.name()
    }

    /// One LLM call, no retry. An empty reply or a "no symptoms" marker is
    /// [`ExtractionError::NoSymptoms`].
    pub async fn extract(&self, raw_symptoms: &str) -> Result<String, ExtractionError> {
        let prompt = build_extraction_prompt(raw_symptoms);
        let reply = self.client.generate(&prompt).await?;
        let extracted = reply.trim().to_lowercase();

        tracing::debug!(backend = self.client.name(), extracted = %extracted, "LLM extracted symptoms");

        let marker = extracted.trim_end_matches('.').trim();
        if marker.is_empty() || NO_SYMPTOM_MARKERS.contains(&marker) {
            return Err(ExtractionError::NoSymptoms);
        }
        Ok(extracted)
    }
}

/// Stand-in used when no LLM backend is configured; every call fails with
/// [`ExtractionError::NotConfigured`].
pub struct UnconfiguredClient {
    reason: String,
}

impl UnconfiguredClient {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl LlmClient for UnconfiguredClient {
    fn name(&self) -> &str {
        "unconfigured"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, ExtractionError> {
        Err(ExtractionError::NotConfigured(self.reason.clone()))
    }
}

/// Mock LLM client for testing: returns a configurable response.
pub struct MockLlmClient {
    response: Result<String, fn() -> ExtractionError>,
}

impl MockLlmClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: Ok(response.to_string()),
        }
    }

    /// A client whose every call fails with the error `make` builds.
    pub fn failing(make: fn() -> ExtractionError) -> Self {
        Self {
            response: Err(make),
        }
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, ExtractionError> {
        match &self.response {
            Ok(text) => Ok(text.clone()),
            Err(make) => Err(make()),
        }
    }
}
