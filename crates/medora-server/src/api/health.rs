//! Liveness and storage readiness
//!
//! GET /api/health answers 200 with `UP` when the backend responds, 503 otherwise.

use actix_web::{HttpResponse, get, web};
use serde::Serialize;

use crate::error::SERVER_ERROR;
use crate::model::common::{self, AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthStatus {
    status: &'static str,
    storage_mode: String,
}

#[get("/health")]
pub async fn health(data: web::Data<AppState>) -> HttpResponse {
    let storage_mode = data.entities().storage_mode().to_string();

    match data.entities().health_check().await {
        Ok(()) => common::Result::<()>::http_success(HealthStatus {
            status: "UP",
            storage_mode,
        }),
        Err(e) => {
            tracing::error!(error = %e, "storage health check failed");
            common::Result::<()>::http_response(
                503,
                SERVER_ERROR.code,
                e.to_string(),
                HealthStatus {
                    status: "DOWN",
                    storage_mode,
                },
            )
        }
    }
}
