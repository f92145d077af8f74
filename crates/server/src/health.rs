use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::routes::AppState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub renderer: HealthCheck,
    pub checked_at: String,
}

/// The service has no hard runtime dependency to probe, so health always
/// reports ready; the renderer check surfaces whether invoices come out as
/// PDF or as the HTML fallback.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let pdf_available = state.pipeline.renderer().pdf_conversion_available();

    let payload = HealthResponse {
        status: "ready",
        service: HealthCheck {
            status: "ready",
            detail: "tally-server runtime initialized".to_string(),
        },
        renderer: HealthCheck {
            status: "ready",
            detail: if pdf_available {
                "wkhtmltopdf available, rendering pdf invoices".to_string()
            } else {
                "wkhtmltopdf not found, rendering html invoices".to_string()
            },
        },
        checked_at: Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(payload))
}
