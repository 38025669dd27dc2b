//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::ApiContext;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub extractor: String,
    pub rules: String,
}

/// `GET /health`: liveness plus which extractor and rule source are active.
pub async fn check(State(ctx): State<ApiContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: crate::config::APP_VERSION,
        extractor: ctx.core.diagnosis.extractor_backend().to_string(),
        rules: ctx.core.diagnosis.rules().to_string(),
    })
}
