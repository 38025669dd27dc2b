//! `POST /diagnosis`

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use tracing::Instrument;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, DiagnosisRequest, DiagnosisResponse};
use crate::models::PatientName;

/// Validate the request, run the diagnosis pipeline, format the result.
///
/// Validation failures are reported together and never reach the extractor
/// or the knowledge base.
pub async fn diagnose(
    State(ctx): State<ApiContext>,
    payload: Result<Json<DiagnosisRequest>, JsonRejection>,
) -> Result<Json<DiagnosisResponse>, ApiError> {
    let Json(request) =
        payload.map_err(|rejection| ApiError::Validation(vec![format!("body: {}", rejection.body_text())]))?;

    let mut errors = Vec::new();
    let patient = match PatientName::parse(&request.patient_name) {
        Ok(patient) => Some(patient),
        Err(e) => {
            errors.push(format!("patient_name: {e}"));
            None
        }
    };
    if request.raw_symptoms.trim().is_empty() {
        errors.push("raw_symptoms: Symptom description must not be empty".to_string());
    }
    let patient = match patient {
        Some(patient) if errors.is_empty() => patient,
        _ => return Err(ApiError::Validation(errors)),
    };

    let span = tracing::info_span!("diagnosis", request_id = %Uuid::new_v4(), patient = %patient);
    let result = async {
        tracing::info!("Diagnosis requested");
        ctx.core
            .diagnosis
            .diagnose(&ctx.core.kb, patient, &request.raw_symptoms)
            .await
    }
    .instrument(span)
    .await?;

    Ok(Json(result.into()))
}
