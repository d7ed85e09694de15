//! Evaluation report endpoint

use axum::Json;

use crate::types::ReportResponse;

/// GET /report - Fixed placeholder evaluation scores
pub async fn get_report() -> Json<ReportResponse> {
    Json(ReportResponse::default())
}
