//! Shared application state.
//!
//! One `CoreState` per process, wrapped in `Arc` at startup and handed to the
//! HTTP layer. It owns the knowledge base; nothing else holds a reference to
//! it, so every mutation goes through the diagnosis service's locked
//! critical section.

use std::sync::{Arc, Mutex};

use crate::config::AppConfig;
use crate::diagnosis::DiagnosisService;
use crate::extraction::{ExtractionError, LlmClient, SymptomExtractor};
use crate::kb::{KbError, KnowledgeBase};

pub struct CoreState {
    pub config: AppConfig,
    /// Process-lifetime fact store. `std` mutex: only locked on blocking workers.
    pub kb: Arc<Mutex<KnowledgeBase>>,
    pub diagnosis: DiagnosisService,
}

impl CoreState {
    /// Build state from configuration, constructing the configured LLM client.
    pub fn new(config: AppConfig) -> Result<Self, CoreError> {
        let client = config.llm.build_client()?;
        Self::with_client(config, client)
    }

    /// Build state around an explicit LLM client.
    ///
    /// Parses the configured rule set once so a broken rule file fails at
    /// startup rather than on the first request.
    pub fn with_client(config: AppConfig, client: Arc<dyn LlmClient>) -> Result<Self, CoreError> {
        let rules = config.rules.load()?;
        tracing::info!(
            source = %config.rules,
            rules = rules.rules.len(),
            axioms = rules.axioms.len(),
            "Rule set validated"
        );

        let diagnosis = DiagnosisService::new(
            SymptomExtractor::new(client),
            config.rules.clone(),
            config.proof_depth,
        );

        Ok(Self {
            kb: Arc::new(Mutex::new(KnowledgeBase::new(config.max_proofs))),
            diagnosis,
            config,
        })
    }
}

// ═══════════════════════════════════════════════════════════
// Error types
// ═══════════════════════════════════════════════════════════

/// Errors from CoreState construction.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Cannot create symptom extractor: {0}")]
    Extractor(#[from] ExtractionError),
    #[error("Cannot load rule set: {0}")]
    Rules(#[from] KbError),
}
