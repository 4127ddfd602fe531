//! HTTP API for the Payroll Engine.
//!
//! This module exposes the payroll engine over a minimal REST API
//! using the [`axum`](https://crates.io/crates/axum) framework.  The
//! API is stateless apart from the default [`PayrollConfig`]: clients
//! post the employees, catalog and overrides for a run and receive the
//! per-employee results and the summary as JSON.
//!
//! Routes:
//! - `POST /api/payroll/calculate`: run payroll; an optional `config`
//!   field replaces the server default for that request.
//! - `POST /api/payroll/validate`: soft validation warnings.
//! - `GET /api/payroll/config`: the server's default configuration.

use crate::config::PayrollConfig;
use crate::engine::run_payroll;
use crate::error::PayrollError;
use crate::models::{PayRunInput, PayRunResult};
use crate::validation::{validate_payroll, PayrollWarning};
use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;

/// Application state shared across requests.  The default
/// configuration is fixed for the lifetime of the server.
pub struct AppState {
    pub config: PayrollConfig,
}

/// Body of `POST /api/payroll/calculate`.
#[derive(Debug, Clone, Deserialize)]
pub struct CalculateRequest {
    #[serde(flatten)]
    pub input: PayRunInput,
    #[serde(default)]
    pub config: Option<PayrollConfig>,
}

/// Body of the `POST /api/payroll/validate` response.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub warnings: Vec<PayrollWarning>,
    pub messages: Vec<String>,
}

impl IntoResponse for PayrollError {
    fn into_response(self) -> Response {
        let status = match self {
            PayrollError::InvalidConfig(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({"error": self.to_string()}));
        (status, body).into_response()
    }
}

/// Build the API router around the given default configuration.
/// Returns the router and a handle to the state.
pub fn build_router(config: PayrollConfig) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState { config });
    let router = Router::new()
        .route("/api/payroll/calculate", post(calculate_handler))
        .route("/api/payroll/validate", post(validate_handler))
        .route("/api/payroll/config", get(config_handler))
        .with_state(state.clone());
    (router, state)
}

/// Handler for POST /api/payroll/calculate
async fn calculate_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<CalculateRequest>,
) -> std::result::Result<Json<PayRunResult>, PayrollError> {
    let config = match request.config {
        Some(config) => {
            config.validate()?;
            config
        }
        None => app_state.config.clone(),
    };
    Ok(Json(run_payroll(&request.input, &config)))
}

/// Handler for POST /api/payroll/validate
async fn validate_handler(Json(input): Json<PayRunInput>) -> Json<ValidationReport> {
    let warnings = validate_payroll(&input.employees, &input.components, &input.overrides);
    let messages = warnings.iter().map(ToString::to_string).collect();
    Json(ValidationReport {
        valid: warnings.is_empty(),
        warnings,
        messages,
    })
}

/// Handler for GET /api/payroll/config
async fn config_handler(State(app_state): State<Arc<AppState>>) -> Json<PayrollConfig> {
    Json(app_state.config.clone())
}

/// Launch the API server.  Binds to `addr` and blocks until the
/// server terminates (e.g. when interrupted).
pub async fn serve(addr: SocketAddr, config: PayrollConfig) -> Result<()> {
    let (router, _state) = build_router(config);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);
    axum::serve(listener, router).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request_body() -> serde_json::Value {
        json!({
            "employees": [
                {"id": "emp-1", "nama": "Budi", "jabatan": "Operator", "site": "Pit A", "kontrakUpahHarian": 200000}
            ],
            "components": [
                {"id": "tunj", "nama": "Tunjangan", "tipe": "EARNING", "taxable": true,
                 "method": "PERSENTASE", "basis": "UPAH_HARIAN", "rate": 10}
            ],
            "overrides": [
                {"employeeId": "emp-1", "hariKerja": 22, "selectedStandardComponents": ["tunj"]},
                {"employeeId": "ghost", "hariKerja": 22}
            ],
            "period": {"start": "2025-01-01", "end": "2025-01-31"}
        })
    }

    #[tokio::test]
    async fn test_calculate_with_server_config() {
        let (_router, state) = build_router(PayrollConfig::default().with_tax_rate(0.05));
        let request: CalculateRequest = serde_json::from_value(request_body()).unwrap();

        let Json(result) = calculate_handler(State(state), Json(request)).await.unwrap();
        assert_eq!(result.results.len(), 1);
        assert_eq!(result.skipped, vec!["ghost".to_string()]);
        assert_eq!(result.results[0].bruto, 4_420_000.0);
        assert_eq!(result.results[0].tax, 221_000.0);
        assert_eq!(result.period.unwrap().end, "2025-01-31");
    }

    #[tokio::test]
    async fn test_calculate_with_request_config() {
        let (_router, state) = build_router(PayrollConfig::default().with_tax_rate(0.05));
        let mut body = request_body();
        body["config"] = json!({"taxRate": 0.0});
        let request: CalculateRequest = serde_json::from_value(body).unwrap();

        let Json(result) = calculate_handler(State(state), Json(request)).await.unwrap();
        assert_eq!(result.results[0].tax, 0.0);
        assert_eq!(result.summary.total_neto, 4_420_000.0);
    }

    #[tokio::test]
    async fn test_invalid_request_config_is_rejected() {
        let (_router, state) = build_router(PayrollConfig::default());
        let mut body = request_body();
        body["config"] = json!({"taxRate": 12});
        let request: CalculateRequest = serde_json::from_value(body).unwrap();

        let err = calculate_handler(State(state), Json(request)).await.unwrap_err();
        assert!(matches!(err, PayrollError::InvalidConfig(_)));
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_validate_reports_warnings() {
        let input: PayRunInput = serde_json::from_value(request_body()).unwrap();
        let Json(report) = validate_handler(Json(input)).await;
        assert!(!report.valid);
        assert_eq!(report.messages, vec!["override references unknown employee ghost".to_string()]);
    }

    #[tokio::test]
    async fn test_config_handler_returns_default() {
        let config = PayrollConfig::default().with_tax_rate(0.02);
        let (_router, state) = build_router(config.clone());
        assert_eq!(state.config, config);
        let Json(served) = config_handler(State(state.clone())).await;
        assert_eq!(served, config);

        // A request-scoped config does not replace the server default.
        let mut body = request_body();
        body["config"] = json!({"taxRate": 0.3});
        let request: CalculateRequest = serde_json::from_value(body).unwrap();
        calculate_handler(State(state.clone()), Json(request)).await.unwrap();
        let Json(served) = config_handler(State(state)).await;
        assert_eq!(served.tax_rate, 0.02);
    }
}
