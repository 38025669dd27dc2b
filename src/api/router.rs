//! HTTP router: `/diagnosis`, `/health`, CORS and request tracing.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the application router around shared state.
pub fn api_router(core: Arc<CoreState>) -> Router {
    let cors = cors_layer(&core.config.cors_origins);
    Router::new()
        .route("/diagnosis", post(endpoints::diagnosis::diagnose))
        .route("/health", get(endpoints::health::check))
        .with_state(ApiContext::new(core))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Listed origins only, with credentials. Methods and headers are mirrored
/// from the preflight request since wildcards are not allowed with credentials.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::config::AppConfig;
    use crate::extraction::{ExtractionError, LlmClient, MockLlmClient, UnconfiguredClient};
    use crate::kb::FactStore;
    use crate::models::PatientName;

    fn test_core(client: impl LlmClient + 'static) -> Arc<CoreState> {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        Arc::new(CoreState::with_client(config, Arc::new(client)).unwrap())
    }

    fn diagnosis_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/diagnosis")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn diagnosis_returns_readable_result() {
        let core = test_core(MockLlmClient::new("Fever, Cough, Fatigue"));
        let app = api_router(core.clone());

        let response = app
            .oneshot(diagnosis_request(serde_json::json!({
                "patient_name": "  alice ",
                "raw_symptoms": "burning up, coughing, wiped out"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["patient_name"], "Alice");
        assert_eq!(json["symptoms"], serde_json::json!(["Fever", "Cough", "Fatigue"]));
        assert_eq!(json["diagnosis_result"], serde_json::json!(["Influenza"]));
        assert!(json.get("message").is_none());

        let patient = PatientName::parse("Alice").unwrap();
        assert_eq!(core.kb.lock().unwrap().read_symptoms(&patient).unwrap().len(), 3);
    }

    #[tokio::test]
    async fn empty_diagnosis_has_message() {
        let app = api_router(test_core(MockLlmClient::new("itchy elbow")));
        let response = app
            .oneshot(diagnosis_request(serde_json::json!({
                "patient_name": "Bob",
                "raw_symptoms": "my elbow itches"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["diagnosis_result"], serde_json::json!([]));
        assert_eq!(json["message"], "No diagnosis found");
    }

    #[tokio::test]
    async fn invalid_name_is_422_and_store_untouched() {
        let core = test_core(MockLlmClient::new("fever"));
        let app = api_router(core.clone());

        let response = app
            .oneshot(diagnosis_request(serde_json::json!({
                "patient_name": "Mary Jane",
                "raw_symptoms": "fever"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = json_body(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Validation error");
        assert_eq!(
            json["errors"][0],
            "patient_name: Patient name must be a single first name (letters only)"
        );
        assert_eq!(core.kb.lock().unwrap().fact_count(), 0);
    }

    #[tokio::test]
    async fn every_invalid_field_is_reported() {
        let app = api_router(test_core(MockLlmClient::new("fever")));
        let response = app
            .oneshot(diagnosis_request(serde_json::json!({
                "patient_name": "",
                "raw_symptoms": "   "
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = json_body(response).await;
        let errors = json["errors"].as_array().unwrap();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].as_str().unwrap().starts_with("patient_name:"));
        assert!(errors[1].as_str().unwrap().starts_with("raw_symptoms:"));
    }

    #[tokio::test]
    async fn valid_name_with_blank_symptoms_is_422() {
        let core = test_core(MockLlmClient::new("fever"));
        let response = api_router(core.clone())
            .oneshot(diagnosis_request(serde_json::json!({
                "patient_name": "alice",
                "raw_symptoms": ""
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = json_body(response).await;
        assert_eq!(json["errors"].as_array().unwrap().len(), 1);
        assert_eq!(core.kb.lock().unwrap().fact_count(), 0);
    }

    #[tokio::test]
    async fn missing_field_is_422() {
        let app = api_router(test_core(MockLlmClient::new("fever")));
        let response = app
            .oneshot(diagnosis_request(serde_json::json!({ "patient_name": "Alice" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = json_body(response).await;
        assert!(json["errors"][0].as_str().unwrap().contains("raw_symptoms"));
    }

    #[tokio::test]
    async fn unrecognized_symptoms_is_400() {
        let app = api_router(test_core(MockLlmClient::new("No Symptoms")));
        let response = app
            .oneshot(diagnosis_request(serde_json::json!({
                "patient_name": "Alice",
                "raw_symptoms": "the weather is nice"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(
            json["message"],
            "I am unable to identify any recognizable symptoms from the provided input."
        );
    }

    #[tokio::test]
    async fn missing_api_key_is_503() {
        let app = api_router(test_core(UnconfiguredClient::new("GEMINI_API_KEY is not set")));
        let response = app
            .oneshot(diagnosis_request(serde_json::json!({
                "patient_name": "Alice",
                "raw_symptoms": "fever"
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn llm_service_error_is_500() {
        let app = api_router(test_core(MockLlmClient::failing(|| ExtractionError::ServiceError {
            status: 500,
            body: "upstream exploded".into(),
        })));
        let response = app
            .oneshot(diagnosis_request(serde_json::json!({
                "patient_name": "Alice",
                "raw_symptoms": "fever"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert_eq!(json["message"], "Internal Server Error");
    }

    #[tokio::test]
    async fn health_reports_backend_and_rules() {
        let app = api_router(test_core(MockLlmClient::new("")));
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["extractor"], "mock");
        assert_eq!(json["rules"], "bundled");
    }

    #[tokio::test]
    async fn cors_preflight_allows_configured_origin() {
        let app = api_router(test_core(MockLlmClient::new("")));
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/diagnosis")
                    .header(header::ORIGIN, "http://localhost:5173")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:5173"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST");
    }

    #[tokio::test]
    async fn cors_ignores_unknown_origin() {
        let app = api_router(test_core(MockLlmClient::new("")));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header(header::ORIGIN, "http://evil.test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }
}
