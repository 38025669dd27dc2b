pub mod normalize;
pub mod parser;
pub mod reconcile;
pub mod service;

pub use normalize::*;
pub use parser::*;
pub use reconcile::*;
pub use service::*;

use thiserror::Error;

use crate::extraction::ExtractionError;
use crate::kb::KbError;

#[derive(Error, Debug)]
pub enum DiagnosisError {
    #[error("No recognizable symptoms in input")]
    NoSymptoms,

    #[error("Symptom extraction failed: {0}")]
    Extraction(ExtractionError),

    #[error("Knowledge base error: {0}")]
    Knowledge(#[from] KbError),

    #[error("Diagnosis worker failed: {0}")]
    Worker(String),
}

impl From<ExtractionError> for DiagnosisError {
    fn from(e: ExtractionError) -> Self {
        match e {
            ExtractionError::NoSymptoms => DiagnosisError::NoSymptoms,
            other => DiagnosisError::Extraction(other),
        }
    }
}
