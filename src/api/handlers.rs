//! HTTP request handlers for the VR engine API.
//!
//! This module contains the handler functions for all API endpoints.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::calculation::run_calculation;
use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::models::{CalculationRun, ReferenceMonth};

use super::request::CalculationRequest;
use super::response::{ApiError, ApiErrorResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/calculate", post(calculate_handler))
        .with_state(state)
}

fn json_error(status: StatusCode, error: ApiError) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(error),
    )
        .into_response()
}

fn rejection_error(rejection: JsonRejection, correlation_id: Uuid) -> ApiError {
    match rejection {
        JsonRejection::JsonDataError(err) => {
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") || body_text.contains("unknown variant") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    }
}

/// Handler for POST /calculate endpoint.
///
/// Accepts the month's tables and returns the computed run.
async fn calculate_handler(
    State(state): State<AppState>,
    payload: Result<Json<CalculationRequest>, JsonRejection>,
) -> impl IntoResponse {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing calculation request");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            return json_error(
                StatusCode::BAD_REQUEST,
                rejection_error(rejection, correlation_id),
            );
        }
    };

    let start_time = Instant::now();
    match perform_calculation(request, state.config()) {
        Ok(run) => {
            info!(
                correlation_id = %correlation_id,
                run_id = %run.run_id,
                competence = %run.reference.competence(),
                employees = run.totals.employees,
                excluded = run.totals.excluded,
                total_value = %run.totals.total_value,
                warnings = run.warnings.len(),
                duration_us = start_time.elapsed().as_micros(),
                "Calculation completed successfully"
            );
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                Json(run),
            )
                .into_response()
        }
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "Calculation failed"
            );
            let api_error: ApiErrorResponse = err.into();
            json_error(api_error.status, api_error.error)
        }
    }
}

/// Validates the reference month, builds the dataset and runs the engine.
fn perform_calculation(
    request: CalculationRequest,
    config: &EngineConfig,
) -> EngineResult<CalculationRun> {
    let reference = ReferenceMonth::new(request.reference_month, request.reference_year)?;
    let dataset = request.into_dataset(config.columns());
    run_calculation(&dataset, config, reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;
    use axum::{body::Body, http::Request};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn create_test_state() -> AppState {
        let loader = ConfigLoader::load("./config/default").expect("Failed to load config");
        AppState::new(loader.into_config())
    }

    async fn post_json(body: String) -> (StatusCode, Value) {
        let app = create_router(create_test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/calculate")
                    .header("Content-Type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn valid_body() -> Value {
        json!({
            "reference_month": 5,
            "reference_year": 2025,
            "tables": {
                "active": {
                    "headers": ["MATRICULA", "TITULO DO CARGO", "Sindicato"],
                    "rows": [
                        ["1001", "ANALISTA", "SINDPD SP - SIND.TRAB.EM PROC DADOS"]
                    ]
                },
                "union_rates": {
                    "headers": ["ESTADO", "VALOR"],
                    "rows": [["São Paulo", "37.50"]]
                },
                "working_days": {
                    "headers": ["SINDICATO", "DIAS UTEIS"],
                    "rows": [["SINDPD SP - SIND.TRAB.EM PROC DADOS", 22]]
                }
            }
        })
    }

    #[tokio::test]
    async fn test_calculate_returns_run() {
        let (status, body) = post_json(valid_body().to_string()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["benefits"][0]["employee_id"], "1001");
        assert_eq!(body["benefits"][0]["payable_days"], "22");
        assert_eq!(body["benefits"][0]["total_value"], "825.00");
        assert_eq!(body["totals"]["employees"], 1);
    }

    #[tokio::test]
    async fn test_malformed_json_returns_400() {
        let (status, body) = post_json("{ not json".to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "MALFORMED_JSON");
    }

    #[tokio::test]
    async fn test_invalid_month_returns_400() {
        let mut body = valid_body();
        body["reference_month"] = json!(13);
        let (status, body) = post_json(body.to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_REFERENCE_MONTH");
    }

    #[tokio::test]
    async fn test_missing_active_table_returns_400() {
        let mut body = valid_body();
        body["tables"]
            .as_object_mut()
            .unwrap()
            .remove("active");
        let (status, body) = post_json(body.to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "MISSING_BASE_ROSTER");
    }

    #[tokio::test]
    async fn test_missing_tables_field_is_validation_error() {
        let body = json!({ "reference_month": 5, "reference_year": 2025 });
        let (status, body) = post_json(body.to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }
}
