//! Shared types for the HTTP layer.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core_state::CoreState;
use crate::models::DiagnosisResult;

/// Shared context for all API routes.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }
}

/// `POST /diagnosis` request body.
#[derive(Debug, Clone, Deserialize)]
pub struct DiagnosisRequest {
    pub patient_name: String,
    pub raw_symptoms: String,
}

/// `POST /diagnosis` success body.
#[derive(Debug, Serialize)]
pub struct DiagnosisResponse {
    pub success: bool,
    pub patient_name: String,
    pub symptoms: Vec<String>,
    pub diagnosis_result: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl From<DiagnosisResult> for DiagnosisResponse {
    fn from(result: DiagnosisResult) -> Self {
        Self {
            success: true,
            patient_name: result.patient.to_string(),
            symptoms: result.symptom_labels(),
            diagnosis_result: result.disease_labels(),
            message: result.is_empty().then_some("No diagnosis found"),
        }
    }
}
