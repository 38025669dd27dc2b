use async_trait::async_trait;

use super::ExtractionError;

/// A text-generation backend.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Short backend identifier for logs and `/health` (`gemini`, `ollama`, ...).
    fn name(&self) -> &str;

    /// Generate a completion for a single prompt.
    async fn generate(&self, prompt: &str) -> Result<String, ExtractionError>;
}

/// Map a reqwest send failure onto the extraction error taxonomy.
pub(crate) fn send_error(e: reqwest::Error, base_url: &str, timeout_secs: u64) -> ExtractionError {
    if e.is_connect() {
        ExtractionError::Connection(base_url.to_string())
    } else if e.is_timeout() {
        ExtractionError::HttpClient(format!("Request timed out after {timeout_secs}s"))
    } else {
        ExtractionError::HttpClient(e.to_string())
    }
}

/// Fail with [`ExtractionError::ServiceError`] unless the response is 2xx.
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, ExtractionError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ExtractionError::ServiceError {
        status: status.as_u16(),
        body,
    })
}
